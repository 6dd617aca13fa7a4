//! Variable elimination over a `Factor`.
//!
//! Each operator reduces the table along the axes of the eliminated `Variable`s and returns a
//! `Factor` over the remaining, still sorted, scope.

use super::{scope, Factor, Table};
use crate::util::{FactorError, Result};
use crate::variable::Variable;

use ndarray::prelude as nd;
use ndarray::Zip;
use tracing::debug;


impl Factor {

    /// Reduce every axis of `elim` with `reduce`, highest axis first so lower positions stay valid
    fn eliminate_with<F>(&self, elim: &[Variable], name: &str, reduce: F) -> Result<Factor>
        where F: Fn(nd::ArrayViewD<f64>, nd::Axis) -> Table
    {
        let axes = scope::axes_of(&self.scope, elim)?;
        debug!(op = name, factor = %self, ?axes, "eliminating variables");

        let scope = self.scope.iter()
                              .enumerate()
                              .filter(|(i, _)| !axes.contains(i))
                              .map(|(_, &v)| v)
                              .collect();

        let mut table = self.table.clone();
        for &axis in axes.iter().rev() {
            table = reduce(table.view(), nd::Axis(axis));
        }

        Ok(Factor { scope, table })
    }


    /// Sum out the `Variable`s of `elim`
    ///
    /// Defined in Koller & Friedman 9.3.1
    ///
    /// # Errors
    /// * `FactorError::Scope` if a `Variable` of `elim` is not in the scope
    pub fn sum(&self, elim: &[Variable]) -> Result<Factor> {
        self.eliminate_with(elim, "sum", |t, axis| t.sum_axis(axis))
    }

    /// Eliminate the `Variable`s of `elim` by maximization. `nan` entries propagate.
    pub fn max(&self, elim: &[Variable]) -> Result<Factor> {
        self.eliminate_with(elim, "max", |t, axis| {
            t.fold_axis(axis, f64::NEG_INFINITY, |&acc, &x| nan_max(acc, x))
        })
    }

    /// Eliminate the `Variable`s of `elim` by minimization. `nan` entries propagate.
    pub fn min(&self, elim: &[Variable]) -> Result<Factor> {
        self.eliminate_with(elim, "min", |t, axis| {
            t.fold_axis(axis, f64::INFINITY, |&acc, &x| nan_min(acc, x))
        })
    }


    /// Eliminate the `Variable`s of `elim` by log-sum-exp: `log(sum(exp(x)))`.
    ///
    /// The maximum of every output cell is subtracted before exponentiating and added back
    /// afterwards, so large magnitudes do not overflow. A cell whose maximum is infinite is not
    /// shifted.
    pub fn lse(&self, elim: &[Variable]) -> Result<Factor> {
        let mut shift = self.max(elim)?;
        shift.table.mapv_inplace(|m| if m.is_finite() { m } else { 0. });

        let aligned = scope::align(&shift, &self.scope);
        let aligned = aligned.broadcast(self.table.raw_dim()).expect("shift does not broadcast to factor scope");

        let shifted = Factor {
            scope: self.scope.clone(),
            table: Zip::from(&self.table).and(&aligned).map_collect(|&x, &m| (x - m).exp())
        };

        let mut result = shifted.sum(elim)?;
        result.ln_inplace();
        result.plus_inplace(&shift)?;

        Ok(result)
    }


    /// Eliminate the `Variable`s of `elim` by the power sum `(sum(x^p))^(1/p)`.
    ///
    /// `p = inf` and `p = -inf` are the limits `max` and `min`.
    ///
    /// # Errors
    /// * `FactorError::Domain` if `p` is zero or `nan`
    /// * `FactorError::Scope` if a `Variable` of `elim` is not in the scope
    pub fn sum_power(&self, elim: &[Variable], p: f64) -> Result<Factor> {
        check_power(p)?;

        if p == f64::INFINITY {
            self.max(elim)
        } else if p == f64::NEG_INFINITY {
            self.min(elim)
        } else if p == 1. {
            self.sum(elim)
        } else {
            let powered = Factor { scope: self.scope.clone(), table: self.table.mapv(|x| x.powf(p)) };
            let mut result = powered.sum(elim)?;
            result.table.mapv_inplace(|x| x.powf(1. / p));
            Ok(result)
        }
    }


    /// Eliminate the `Variable`s of `elim` by the log power sum `(1/p) * log(sum(exp(p * x)))`,
    /// stabilized the same way as `lse`.
    ///
    /// `p = inf` and `p = -inf` are the limits `max` and `min`.
    ///
    /// # Errors
    /// * `FactorError::Domain` if `p` is zero or `nan`
    /// * `FactorError::Scope` if a `Variable` of `elim` is not in the scope
    pub fn lse_power(&self, elim: &[Variable], p: f64) -> Result<Factor> {
        check_power(p)?;

        if p == f64::INFINITY {
            self.max(elim)
        } else if p == f64::NEG_INFINITY {
            self.min(elim)
        } else if p == 1. {
            self.lse(elim)
        } else {
            let mut result = (self * p).lse(elim)?;
            result /= p;
            Ok(result)
        }
    }


    /// Sum out every `Variable` except those of `keep`
    ///
    /// # Errors
    /// * `FactorError::Scope` if a `Variable` of `keep` is not in the scope
    pub fn marginal(&self, keep: &[Variable]) -> Result<Factor> {
        self.sum(&self.complement(keep)?)
    }

    /// Maximize out every `Variable` except those of `keep`
    pub fn max_marginal(&self, keep: &[Variable]) -> Result<Factor> {
        self.max(&self.complement(keep)?)
    }

    /// Minimize out every `Variable` except those of `keep`
    pub fn min_marginal(&self, keep: &[Variable]) -> Result<Factor> {
        self.min(&self.complement(keep)?)
    }


    /// The scope `Variable`s not in `keep`, checking that `keep` is part of the scope
    fn complement(&self, keep: &[Variable]) -> Result<Vec<Variable>> {
        scope::axes_of(&self.scope, keep)?;

        let mut keep = keep.to_vec();
        keep.sort();
        Ok(scope::difference(&self.scope, &keep))
    }

}


fn check_power(p: f64) -> Result<()> {
    if p == 0. || p.is_nan() {
        return Err(FactorError::domain(format!("Power must be non-zero, got {}", p)));
    }
    Ok(())
}

pub(crate) fn nan_max(acc: f64, x: f64) -> f64 {
    if x.is_nan() || x > acc { x } else { acc }
}

pub(crate) fn nan_min(acc: f64, x: f64) -> f64 {
    if x.is_nan() || x < acc { x } else { acc }
}


// Unit tests
#[cfg(test)]
mod tests {
    use super::*;

    fn var(id: usize, card: usize) -> Variable {
        Variable::new(id, card).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        a == b || (a - b).abs() <= 1e-9 * (1. + a.abs().max(b.abs()))
    }

    /// Example taken from Koller & Friedman Figure 4.3
    fn joint() -> (Variable, Variable, Variable, Factor) {
        let a = var(0, 3);
        let b = var(1, 2);
        let c = var(2, 2);

        let f = Factor::from_vec(
            vec![ a, b, c ],
            vec![ 0.25, 0.35, 0.08, 0.16, 0.05, 0.07, 0., 0., 0.15, 0.21, 0.09, 0.18 ]
        ).unwrap();

        (a, b, c, f)
    }

    #[test]
    /// Example taken from Koller & Friedman Figure 9.7
    fn sum() {
        let (a, b, c, phi) = joint();

        let marginalized = phi.sum(&[ b ]).unwrap();
        assert_eq!(marginalized.vars(), &[ a, c ]);

        let expected = array![[0.33, 0.51], [0.05, 0.07], [0.24, 0.39]].into_dyn();
        for (x, y) in iproduct!(0..3, 0..2) {
            assert!(close(expected[[x, y].as_ref()], marginalized.value(&[x, y]).unwrap()));
        }

        let total = phi.sum(&[ c, a, b ]).unwrap();
        assert_eq!(total.nvar(), 0);
        assert!(close(total.value(&[]).unwrap(), phi.total()));
    }

    #[test]
    fn sum_errs() {
        let (a, _, _, phi) = joint();
        let d = var(7, 2);

        match phi.sum(&[ a, d ]).expect_err("missing error") {
            FactorError::Scope(_) => assert!(true),
            _ => panic!("wrong error type")
        };
    }

    #[test]
    fn empty_elimination_is_a_copy() {
        let (_, _, _, phi) = joint();
        assert_eq!(phi, phi.sum(&[]).unwrap());
    }

    #[test]
    fn max_and_min() {
        let (a, b, c, phi) = joint();

        let mx = phi.max(&[ a ]).unwrap();
        assert_eq!(mx.vars(), &[ b, c ]);
        assert_eq!(mx.value(&[0, 0]).unwrap(), 0.25);
        assert_eq!(mx.value(&[0, 1]).unwrap(), 0.35);
        assert_eq!(mx.value(&[1, 0]).unwrap(), 0.09);
        assert_eq!(mx.value(&[1, 1]).unwrap(), 0.18);

        let mn = phi.min(&[ b, c ]).unwrap();
        assert_eq!(mn.vars(), &[ a ]);
        assert_eq!(mn.value(&[0]).unwrap(), 0.08);
        assert_eq!(mn.value(&[1]).unwrap(), 0.);
        assert_eq!(mn.value(&[2]).unwrap(), 0.09);
    }

    #[test]
    fn max_propagates_nan() {
        let a = var(0, 3);
        let f = Factor::from_vec(vec![ a ], vec![ 1., f64::NAN, 2. ]).unwrap();
        assert!(f.max(&[ a ]).unwrap().value(&[]).unwrap().is_nan());
        assert!(f.min(&[ a ]).unwrap().value(&[]).unwrap().is_nan());
    }

    #[test]
    fn lse_matches_naive() {
        let (a, b, c, phi) = joint();
        let logs = phi.ln();

        // log-sum-exp of log values is the log of the sum
        let lse = logs.lse(&[ b ]).unwrap();
        let expected = phi.sum(&[ b ]).unwrap().ln();
        assert_eq!(lse.vars(), &[ a, c ]);
        for (x, y) in iproduct!(0..3, 0..2) {
            assert!(close(expected.value(&[x, y]).unwrap(), lse.value(&[x, y]).unwrap()));
        }
    }

    #[test]
    fn lse_is_stable() {
        let a = var(0, 2);
        let b = var(1, 2);
        let f = Factor::from_vec(vec![ a, b ], vec![ 0., 1000., 1000., 1000. ]).unwrap();

        let lse = f.lse(&[ b ]).unwrap();
        let first = lse.value(&[0]).unwrap();
        let second = lse.value(&[1]).unwrap();

        assert!(first.is_finite());
        assert!(close(first, 1000. + (1. + (-1000f64).exp()).ln()));
        assert!(close(second, 1000. + 2f64.ln()));
    }

    #[test]
    fn lse_power_is_stable() {
        let a = var(0, 2);
        let f = Factor::from_vec(vec![ a ], vec![ 0., 1000. ]).unwrap();

        // exp(2000) overflows, the shifted form does not
        let high = f.lse_power(&[ a ], 2.).unwrap().value(&[]).unwrap();
        assert!(high.is_finite());
        assert!(close(high, 1000.));

        // a negative power leans towards the minimum
        let low = f.lse_power(&[ a ], -2.).unwrap().value(&[]).unwrap();
        assert!(low.is_finite());
        assert!(close(low, 0.));
    }

    #[test]
    fn lse_of_negative_infinity() {
        let a = var(0, 2);
        let f = Factor::from_vec(vec![ a ], vec![ f64::NEG_INFINITY, f64::NEG_INFINITY ]).unwrap();
        assert_eq!(f.lse(&[ a ]).unwrap().value(&[]).unwrap(), f64::NEG_INFINITY);
    }

    #[test]
    fn sum_power() {
        let a = var(0, 2);
        let b = var(1, 2);
        let f = Factor::from_vec(vec![ a, b ], vec![ 3., 4., 1., 2. ]).unwrap();

        let l2 = f.sum_power(&[ b ], 2.).unwrap();
        assert!(close(l2.value(&[0]).unwrap(), 5.));
        assert!(close(l2.value(&[1]).unwrap(), 5f64.sqrt()));

        assert_eq!(f.sum_power(&[ b ], 1.).unwrap(), f.sum(&[ b ]).unwrap());
        assert_eq!(f.sum_power(&[ b ], f64::INFINITY).unwrap(), f.max(&[ b ]).unwrap());
        assert_eq!(f.sum_power(&[ b ], f64::NEG_INFINITY).unwrap(), f.min(&[ b ]).unwrap());

        match f.sum_power(&[ b ], 0.).expect_err("missing error") {
            FactorError::Domain(_) => assert!(true),
            _ => panic!("wrong error type")
        };
        assert!(f.sum_power(&[ b ], f64::NAN).is_err());
    }

    #[test]
    fn lse_power() {
        let a = var(0, 2);
        let b = var(1, 3);
        let f = Factor::from_vec(vec![ a, b ], vec![ 0., 1., 2., -5., 10., 3. ]).unwrap();

        for &p in &[ 0.5, 2., -1., -3. ] {
            let actual = f.lse_power(&[ b ], p).unwrap();
            let naive = (&f * p).exp().sum(&[ b ]).unwrap().ln() / p;
            for x in 0..2 {
                assert!(close(naive.value(&[x]).unwrap(), actual.value(&[x]).unwrap()));
            }
        }

        assert_eq!(f.lse_power(&[ b ], 1.).unwrap(), f.lse(&[ b ]).unwrap());
        assert_eq!(f.lse_power(&[ b ], f64::INFINITY).unwrap(), f.max(&[ b ]).unwrap());
        assert_eq!(f.lse_power(&[ b ], f64::NEG_INFINITY).unwrap(), f.min(&[ b ]).unwrap());

        match f.lse_power(&[ b ], 0.).expect_err("missing error") {
            FactorError::Domain(_) => assert!(true),
            _ => panic!("wrong error type")
        };
    }

    #[test]
    fn marginals() {
        let (a, b, c, phi) = joint();

        assert_eq!(phi.marginal(&[ c, a ]).unwrap(), phi.sum(&[ b ]).unwrap());
        assert_eq!(phi.max_marginal(&[ b ]).unwrap(), phi.max(&[ a, c ]).unwrap());
        assert_eq!(phi.min_marginal(&[ a, b, c ]).unwrap(), phi);

        let all = phi.marginal(&[]).unwrap();
        assert_eq!(all.nvar(), 0);

        let d = var(9, 2);
        match phi.marginal(&[ a, d ]).expect_err("missing error") {
            FactorError::Scope(_) => assert!(true),
            _ => panic!("wrong error type")
        };
    }
}
