//! Arithmetic over `Factor`s.
//!
//! Binary operations combine two `Factor`s over the union of their scopes; each operand's table is
//! broadcast across the `Variable`s it does not contain. Division by zero and logarithms of zero
//! follow IEEE semantics and produce `inf`/`nan` rather than errors.

use super::{scope, Factor};
use crate::util::{FactorError, Result};

use ndarray::Zip;
use tracing::debug;

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};


impl Factor {

    /// Combine two `Factor`s elementwise over the union of their scopes
    ///
    /// # Errors
    /// * `FactorError::Scope` if the `Factor`s disagree on the cardinality of a shared id
    fn combine<F>(&self, other: &Factor, op: F) -> Result<Factor>
        where F: Fn(f64, f64) -> f64
    {
        let scope = scope::union(&self.scope, &other.scope)?;
        let shape = scope::shape(&scope);

        let lhs = scope::align(self, &scope);
        let rhs = scope::align(other, &scope);

        // both views have rank |scope| with unit length for missing axes, so broadcasting to the
        // union shape cannot fail
        let lhs = lhs.broadcast(shape.clone()).expect("left operand does not broadcast to union scope");
        let rhs = rhs.broadcast(shape).expect("right operand does not broadcast to union scope");

        let table = Zip::from(&lhs).and(&rhs).map_collect(|&a, &b| op(a, b));

        Ok(Factor { scope, table })
    }


    /// Combine `other` into this `Factor`'s table without reallocating it
    ///
    /// # Errors
    /// * `FactorError::Scope` if the scope of `other` is not a subset of this scope. The `Factor`
    ///   is left untouched.
    fn combine_inplace<F>(&mut self, other: &Factor, name: &str, op: F) -> Result<()>
        where F: Fn(f64, f64) -> f64
    {
        if !scope::is_subset(&other.scope, &self.scope) {
            debug!("rejecting in-place {} of {} by {}", name, self, other);
            return Err(FactorError::scope(format!(
                "Cannot apply {} in place: {} is not a subset of the scope of {}", name, other, self
            )));
        }

        let rhs = scope::align(other, &self.scope);
        let rhs = rhs.broadcast(self.table.raw_dim()).expect("operand does not broadcast to receiver scope");

        Zip::from(&mut self.table).and(&rhs).for_each(|a, &b| *a = op(*a, b));
        Ok(())
    }


    /// Apply `f` to every entry, returning a new `Factor` over the same scope
    fn map<F>(&self, f: F) -> Factor
        where F: Fn(f64) -> f64
    {
        Factor { scope: self.scope.clone(), table: self.table.mapv(f) }
    }


    /// Elementwise sum over the union of both scopes
    pub fn plus(&self, other: &Factor) -> Result<Factor> {
        self.combine(other, |a, b| a + b)
    }

    /// Elementwise difference over the union of both scopes
    pub fn minus(&self, other: &Factor) -> Result<Factor> {
        self.combine(other, |a, b| a - b)
    }

    /// Product of this `Factor` and another `Factor`.
    ///
    /// Defined in Koller & Friedman Section 4.2.1. The scopes need not intersect; disjoint scopes
    /// yield the outer product.
    ///
    /// # Errors
    /// * `FactorError::Scope` if both scopes hold the same id with different cardinalities
    pub fn product(&self, other: &Factor) -> Result<Factor> {
        self.combine(other, |a, b| a * b)
    }

    /// `Factor` division. Calculates Psi(X, Y) = Phi1(X, Y) / Phi2(Y) where Phi1 = self and
    /// Phi2 = other.
    ///
    /// # Notes
    /// Entries divided by zero become `inf`, or `nan` for 0/0.
    pub fn divide(&self, other: &Factor) -> Result<Factor> {
        self.combine(other, |a, b| a / b)
    }


    /// In-place version of `plus`
    ///
    /// # Errors
    /// * `FactorError::Scope` if `other` has a `Variable` outside of this scope
    pub fn plus_inplace(&mut self, other: &Factor) -> Result<()> {
        self.combine_inplace(other, "plus", |a, b| a + b)
    }

    /// In-place version of `minus`
    pub fn minus_inplace(&mut self, other: &Factor) -> Result<()> {
        self.combine_inplace(other, "minus", |a, b| a - b)
    }

    /// In-place version of `product`
    pub fn product_inplace(&mut self, other: &Factor) -> Result<()> {
        self.combine_inplace(other, "product", |a, b| a * b)
    }

    /// In-place version of `divide`
    pub fn divide_inplace(&mut self, other: &Factor) -> Result<()> {
        self.combine_inplace(other, "divide", |a, b| a / b)
    }


    pub fn negate(&self) -> Factor {
        self.map(|x| -x)
    }

    pub fn abs(&self) -> Factor {
        self.map(f64::abs)
    }

    pub fn exp(&self) -> Factor {
        self.map(f64::exp)
    }

    /// Natural logarithm. `ln(0)` is `-inf`, negative entries become `nan`.
    pub fn ln(&self) -> Factor {
        self.map(f64::ln)
    }

    pub fn log10(&self) -> Factor {
        self.map(f64::log10)
    }

    pub fn log2(&self) -> Factor {
        self.map(f64::log2)
    }

    /// Raise every entry to the power `p`
    ///
    /// # Errors
    /// * `FactorError::Domain` if `p` is not finite
    pub fn power(&self, p: f64) -> Result<Factor> {
        check_exponent(p)?;
        Ok(self.map(|x| x.powf(p)))
    }


    pub fn negate_inplace(&mut self) {
        self.table.mapv_inplace(|x| -x);
    }

    pub fn abs_inplace(&mut self) {
        self.table.mapv_inplace(f64::abs);
    }

    pub fn exp_inplace(&mut self) {
        self.table.mapv_inplace(f64::exp);
    }

    pub fn ln_inplace(&mut self) {
        self.table.mapv_inplace(f64::ln);
    }

    pub fn log10_inplace(&mut self) {
        self.table.mapv_inplace(f64::log10);
    }

    pub fn log2_inplace(&mut self) {
        self.table.mapv_inplace(f64::log2);
    }

    /// In-place version of `power`
    pub fn power_inplace(&mut self, p: f64) -> Result<()> {
        check_exponent(p)?;
        self.table.mapv_inplace(|x| x.powf(p));
        Ok(())
    }


    /// The sum of every entry of the table
    pub fn total(&self) -> f64 {
        self.table.sum()
    }

    /// Scale the table to sum to one. A table summing to zero yields `nan` entries.
    pub fn normalize(&self) -> Factor {
        let total = self.total();
        self.map(|x| x / total)
    }

    /// In-place version of `normalize`
    pub fn normalize_inplace(&mut self) {
        let total = self.total();
        self.table /= total;
    }

    /// Overwrite every entry with `value`
    pub fn fill(&mut self, value: f64) {
        self.table.fill(value);
    }

}


fn check_exponent(p: f64) -> Result<()> {
    if !p.is_finite() {
        return Err(FactorError::domain(format!("Exponent must be finite, got {}", p)));
    }
    Ok(())
}


// Operator forms panic where the named methods return an error, the way ndarray's operators panic
// on shapes that do not broadcast
macro_rules! impl_factor_op {
    ($trait:ident, $method:ident, $inherent:ident) => {
        impl<'a, 'b> $trait<&'b Factor> for &'a Factor {
            type Output = Factor;

            fn $method(self, rhs: &'b Factor) -> Factor {
                match self.$inherent(rhs) {
                    Ok(f) => f,
                    Err(e) => panic!("{}", e),
                }
            }
        }

        impl $trait<Factor> for Factor {
            type Output = Factor;

            fn $method(self, rhs: Factor) -> Factor {
                $trait::$method(&self, &rhs)
            }
        }
    };
}

impl_factor_op!(Add, add, plus);
impl_factor_op!(Sub, sub, minus);
impl_factor_op!(Mul, mul, product);
impl_factor_op!(Div, div, divide);


macro_rules! impl_scalar_op {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:tt) => {
        impl<'a> $trait<f64> for &'a Factor {
            type Output = Factor;

            fn $method(self, rhs: f64) -> Factor {
                self.map(|x| x $op rhs)
            }
        }

        impl $trait<f64> for Factor {
            type Output = Factor;

            fn $method(mut self, rhs: f64) -> Factor {
                self.table.mapv_inplace(|x| x $op rhs);
                self
            }
        }

        impl $assign_trait<f64> for Factor {
            fn $assign_method(&mut self, rhs: f64) {
                self.table.mapv_inplace(|x| x $op rhs);
            }
        }
    };
}

impl_scalar_op!(Add, add, AddAssign, add_assign, +);
impl_scalar_op!(Sub, sub, SubAssign, sub_assign, -);
impl_scalar_op!(Mul, mul, MulAssign, mul_assign, *);
impl_scalar_op!(Div, div, DivAssign, div_assign, /);


impl<'a> Neg for &'a Factor {
    type Output = Factor;

    fn neg(self) -> Factor {
        self.negate()
    }
}

impl Neg for Factor {
    type Output = Factor;

    fn neg(mut self) -> Factor {
        self.negate_inplace();
        self
    }
}
