//! Conditioning, optimization, sampling and summary queries over a `Factor`.

use super::eliminate::{nan_max, nan_min};
use super::{scope, Factor};
use crate::util::{FactorError, Result};
use crate::variable::{Assignment, Variable};

use ndarray::prelude as nd;
use ndarray::Dimension;
use rand::Rng;
use tracing::trace;


/// The (pseudo-)distances available to `Factor::distance`.
///
/// `KL`, `Hellinger` and `ChiSquared` compare the normalized tables; the others compare the
/// tables as given.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Distance {
    /// Sum of absolute differences
    L1,

    /// Euclidean distance
    L2,

    /// Largest absolute difference
    LInf,

    /// Kullback-Leibler divergence `D(self || other)`
    KL,

    /// Hellinger distance, between 0 and 1
    Hellinger,

    /// Pearson's chi-squared divergence, with `other` as the reference distribution
    ChiSquared,

    /// Hilbert's projective metric, `max log(a/b) - min log(a/b)`
    Hpm
}


impl Factor {

    /// Reduce the `Factor` to the given partial assignment
    ///
    /// Defined in Koller & Friedman 4.2.3. The conditioned axes are sliced out of the table, so the
    /// result is over the scope minus the assigned `Variable`s.
    ///
    /// # Errors
    /// * `FactorError::Scope` if an assigned `Variable` is not in the scope
    /// * `FactorError::Domain` if an assigned state is out of range
    pub fn condition(&self, evidence: &Assignment) -> Result<Factor> {
        let fixed = self.fixed_axes(evidence.iter().map(|(v, &s)| (v, s)))?;
        Ok(self.slice_axes(fixed))
    }


    /// Reduce the `Factor` given `Variable`s and their states as two parallel lists
    ///
    /// # Errors
    /// * `FactorError::Scope` if the lists differ in length, or a `Variable` is repeated or not in
    ///   the scope
    /// * `FactorError::Domain` if a state is out of range
    pub fn condition2(&self, vars: &[Variable], states: &[usize]) -> Result<Factor> {
        if vars.len() != states.len() {
            return Err(FactorError::scope(format!(
                "{} variables given with {} states", vars.len(), states.len()
            )));
        }

        let fixed = self.fixed_axes(vars.iter().zip(states.iter().cloned()))?;
        Ok(self.slice_axes(fixed))
    }


    /// Resolve `(Variable, state)` pairs into `(axis, state)` pairs sorted by axis
    fn fixed_axes<'a, I>(&self, pairs: I) -> Result<Vec<(usize, usize)>>
        where I: Iterator<Item = (&'a Variable, usize)>
    {
        let mut fixed = Vec::new();
        for (v, state) in pairs {
            let axis = self.scope.binary_search(v).map_err(|_| {
                FactorError::scope(format!("{} is not in the scope of {}", v, self))
            })?;

            if state >= v.cardinality() {
                return Err(FactorError::domain(format!(
                    "State {} is out of range for {} with cardinality {}", state, v, v.cardinality()
                )));
            }

            fixed.push((axis, state));
        }

        fixed.sort();
        if fixed.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(FactorError::scope("A variable was conditioned more than once"));
        }

        Ok(fixed)
    }


    /// Fix each `(axis, state)` of `fixed`; `fixed` must be sorted by axis
    fn slice_axes(&self, fixed: Vec<(usize, usize)>) -> Factor {
        let mut view = self.table.view();
        for &(axis, state) in fixed.iter().rev() {
            view = view.index_axis_move(nd::Axis(axis), state);
        }

        let scope = self.scope.iter()
                              .enumerate()
                              .filter(|(i, _)| !fixed.iter().any(|&(axis, _)| axis == *i))
                              .map(|(_, &v)| v)
                              .collect();

        Factor { scope, table: view.to_owned() }
    }


    /// The configuration with the largest value, in scope order.
    ///
    /// Ties go to the first configuration in row-major order; `nan` entries are skipped.
    pub fn argmax(&self) -> Vec<usize> {
        self.arg_extreme(|x, best| x > best)
    }

    /// The configuration with the smallest value, in scope order.
    ///
    /// Ties go to the first configuration in row-major order; `nan` entries are skipped.
    pub fn argmin(&self) -> Vec<usize> {
        self.arg_extreme(|x, best| x < best)
    }

    /// `argmax` as an `Assignment`
    pub fn argmax2(&self) -> Assignment {
        self.to_assignment(&self.argmax())
    }

    /// `argmin` as an `Assignment`
    pub fn argmin2(&self) -> Assignment {
        self.to_assignment(&self.argmin())
    }


    fn arg_extreme<F>(&self, better: F) -> Vec<usize>
        where F: Fn(f64, f64) -> bool
    {
        let mut best: Option<(nd::IxDyn, f64)> = None;

        for (idx, &x) in self.table.indexed_iter() {
            if x.is_nan() {
                continue;
            }

            let replace = match best {
                Some((_, b)) => better(x, b),
                None => true
            };

            if replace {
                best = Some((idx, x));
            }
        }

        match best {
            Some((idx, _)) => idx.slice().to_vec(),
            None => vec![0; self.scope.len()]
        }
    }


    fn to_assignment(&self, config: &[usize]) -> Assignment {
        self.scope.iter().cloned().zip(config.iter().cloned()).collect()
    }


    /// Draw a configuration with probability proportional to its value, using the thread-local
    /// random number generator
    ///
    /// # Errors
    /// see `sample_with`
    pub fn sample(&self) -> Result<Vec<usize>> {
        self.sample_with(&mut rand::thread_rng())
    }


    /// Draw a configuration with probability proportional to its value
    ///
    /// A single uniform draw is located in the cumulative sum of the flattened table.
    ///
    /// # Errors
    /// * `FactorError::Domain` if an entry is negative or `nan`, or the table does not sum to a
    ///   positive finite value
    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<usize>> {
        if self.table.iter().any(|&x| x < 0. || x.is_nan()) {
            return Err(FactorError::domain(format!("Cannot sample from {} with negative entries", self)));
        }

        let total = self.total();
        if !(total > 0. && total.is_finite()) {
            return Err(FactorError::domain(format!("Cannot sample from {} with total mass {}", self, total)));
        }

        let draw = rng.gen::<f64>() * total;
        trace!(factor = %self, draw, total, "sampling");

        // rounding may leave draw past the last partial sum, in which case the last configuration
        // with positive mass is chosen
        let mut upper = 0.;
        let mut chosen = None;
        for (idx, &x) in self.table.indexed_iter() {
            if x == 0. {
                continue;
            }

            upper += x;
            chosen = Some(idx);
            if draw < upper {
                break;
            }
        }

        chosen.map(|idx| idx.slice().to_vec())
              .ok_or_else(|| FactorError::domain(format!("{} has no positive entries", self)))
    }


    /// `sample` as an `Assignment`
    pub fn sample2(&self) -> Result<Assignment> {
        self.sample2_with(&mut rand::thread_rng())
    }

    /// `sample_with` as an `Assignment`
    pub fn sample2_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Assignment> {
        let config = self.sample_with(rng)?;
        Ok(self.to_assignment(&config))
    }


    /// Check if every entry is finite
    pub fn is_finite(&self) -> bool {
        self.table.iter().all(|x| x.is_finite())
    }

    /// Check if any entry is `nan`
    pub fn is_nan(&self) -> bool {
        self.is_any(f64::is_nan)
    }

    /// Check if `pred` holds for any entry
    pub fn is_any<F>(&self, pred: F) -> bool
        where F: Fn(f64) -> bool
    {
        self.table.iter().any(|&x| pred(x))
    }


    /// Shannon entropy (in nats) of the normalized table. Zero entries contribute nothing.
    pub fn entropy(&self) -> f64 {
        let total = self.total();

        -self.table.iter()
                   .map(|&x| x / total)
                   .filter(|&p| p != 0.)
                   .map(|p| p * p.ln())
                   .sum::<f64>()
    }


    /// Compute the distance of `kind` between this `Factor` and `other`.
    ///
    /// Both tables are broadcast to the union of the scopes before comparison. A `nan` entry in
    /// either table makes the distance `nan`.
    ///
    /// # Errors
    /// * `FactorError::Scope` if the `Factor`s disagree on the cardinality of a shared id
    pub fn distance(&self, other: &Factor, kind: Distance) -> Result<f64> {
        let scope = scope::union(&self.scope, &other.scope)?;
        let shape = scope::shape(&scope);

        let lhs = scope::align(self, &scope);
        let rhs = scope::align(other, &scope);
        let lhs = lhs.broadcast(shape.clone()).expect("left operand does not broadcast to union scope");
        let rhs = rhs.broadcast(shape).expect("right operand does not broadcast to union scope");

        let pairs = lhs.iter().cloned().zip(rhs.iter().cloned());

        let d = match kind {
            Distance::L1 => pairs.map(|(a, b)| (a - b).abs()).sum(),
            Distance::L2 => pairs.map(|(a, b)| (a - b).powi(2)).sum::<f64>().sqrt(),
            Distance::LInf => pairs.map(|(a, b)| (a - b).abs()).fold(0., nan_max),
            Distance::Hpm => {
                let (lo, hi) = pairs.map(|(a, b)| (a / b).ln())
                                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
                                        (nan_min(lo, r), nan_max(hi, r))
                                    });
                hi - lo
            },
            Distance::KL | Distance::Hellinger | Distance::ChiSquared => {
                let za = lhs.sum();
                let zb = rhs.sum();
                let normalized = pairs.map(|(a, b)| (a / za, b / zb));

                match kind {
                    Distance::KL => {
                        normalized.filter(|&(p, _)| p != 0.)
                                  .map(|(p, q)| p * (p / q).ln())
                                  .sum()
                    },
                    Distance::Hellinger => {
                        let s: f64 = normalized.map(|(p, q)| (p.sqrt() - q.sqrt()).powi(2)).sum();
                        (0.5 * s).sqrt()
                    },
                    _ => {
                        normalized.filter(|&(p, q)| p != 0. || q != 0.)
                                  .map(|(p, q)| (p - q).powi(2) / q)
                                  .sum()
                    }
                }
            }
        };

        Ok(d)
    }

}
