//! Definition of the factor module
//!
//! A `Factor` represents a relationship between some set of `Variable`s: a function over every
//! joint configuration of its scope, stored as a dense table.
//!
//! The scope of a `Factor` is always sorted by `Variable` id and the axes of its table follow the
//! same order. Every operation in this module (and its submodules) returns a `Factor` that keeps
//! that invariant.

use crate::util::{FactorError, Result};
use crate::variable::{all_assignments, Assignment, Variable};

use ndarray::prelude as nd;
use tracing::trace;

use std::fmt;

mod eliminate;
mod ops;
mod query;
pub mod scope;

pub use self::query::Distance;

/// Alias f64 ndarray::ArrayD as Table
pub type Table = nd::ArrayD<f64>;


/// A table factor over a sorted scope of discrete `Variable`s.
///
/// A `Factor` with an empty scope holds a single scalar in a 0-dimensional table and acts as a
/// constant in arithmetic.
#[derive(Clone, Debug, PartialEq)]
pub struct Factor {
    /// The scope of the `Factor`, sorted by id
    scope: Vec<Variable>,

    /// The values of the `Factor` table. Axis `i` corresponds to `scope[i]`.
    table: Table
}


impl Factor {

    /// Create a new `Factor`
    ///
    /// The axes of `table` correspond to `scope` in the order given. The resulting `Factor` sorts
    /// its scope and permutes the table axes to match.
    ///
    /// # Errors
    /// * `FactorError::Shape` if the rank or extents of `table` disagree with `scope`
    /// * `FactorError::Scope` if a `Variable` appears twice in `scope`
    pub fn new(scope: Vec<Variable>, table: Table) -> Result<Self> {
        if scope.len() != table.ndim() {
            return Err(FactorError::shape(format!(
                "Scope has {} variables but table has {} dimensions", scope.len(), table.ndim()
            )));
        }

        for (v, &t) in scope.iter().zip(table.shape().iter()) {
            if v.cardinality() != t {
                return Err(FactorError::shape(format!(
                    "Variable {} has cardinality {} but table axis has length {}",
                    v, v.cardinality(), t
                )));
            }
        }

        let mut order: Vec<usize> = (0..scope.len()).collect();
        order.sort_by_key(|&i| scope[i]);
        check_unique(order.iter().map(|&i| &scope[i]))?;

        if order.iter().enumerate().all(|(i, &o)| i == o) {
            return Ok(Factor { scope, table });
        }

        trace!(?order, "permuting table axes into scope order");
        let sorted = order.iter().map(|&i| scope[i]).collect();
        let table = table.permuted_axes(order).as_standard_layout().into_owned();

        Ok(Factor { scope: sorted, table })
    }


    /// Create a new `Factor` from a flat list of values
    ///
    /// `values` are laid out in row-major order over the *sorted* scope, i.e. the `Variable`
    /// with the largest id changes fastest.
    ///
    /// # Errors
    /// * `FactorError::Shape` if `values.len()` is not the product of the cardinalities
    /// * `FactorError::Scope` if a `Variable` appears twice in `scope`
    pub fn from_vec(scope: Vec<Variable>, values: Vec<f64>) -> Result<Self> {
        let scope = canonical_scope(scope)?;
        let shape = scope::shape(&scope);
        let expected: usize = shape.iter().product();

        if values.len() != expected {
            return Err(FactorError::shape(format!(
                "Expected {} values but received {}", expected, values.len()
            )));
        }

        let table = Table::from_shape_vec(shape, values)
            .map_err(|e| FactorError::shape(e.to_string()))?;

        Ok(Factor { scope, table })
    }


    /// Create a `Factor` by evaluating `f` on every complete `Assignment` to `scope`
    pub fn from_fn<F>(scope: Vec<Variable>, mut f: F) -> Result<Self>
        where F: FnMut(&Assignment) -> f64
    {
        let scope = canonical_scope(scope)?;
        let values = all_assignments(&scope).map(|a| f(&a)).collect();

        Factor::from_vec(scope, values)
    }


    /// A `Factor` with empty scope holding `value`
    pub fn constant(value: f64) -> Self {
        Factor { scope: Vec::new(), table: nd::arr0(value).into_dyn() }
    }


    /// A `Factor` over `scope` with every entry equal to one
    pub fn ones(scope: Vec<Variable>) -> Result<Self> {
        let scope = canonical_scope(scope)?;
        let table = Table::ones(scope::shape(&scope));

        Ok(Factor { scope, table })
    }


    /// A `Factor` over `scope` with every entry equal to zero
    pub fn zeros(scope: Vec<Variable>) -> Result<Self> {
        let scope = canonical_scope(scope)?;
        let table = Table::zeros(scope::shape(&scope));

        Ok(Factor { scope, table })
    }


    /// Retrieve the scope of the `Factor`, sorted by id
    pub fn vars(&self) -> &[Variable] {
        &self.scope
    }

    /// The cardinality of each `Variable` in the scope, in scope order
    pub fn dims(&self) -> Vec<usize> {
        scope::shape(&self.scope)
    }

    /// The number of entries in the table
    pub fn numel(&self) -> usize {
        self.table.len()
    }

    /// The number of `Variable`s in the scope
    pub fn nvar(&self) -> usize {
        self.scope.len()
    }

    /// The underlying table; axis `i` corresponds to `self.vars()[i]`
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Consume the `Factor`, returning its table
    pub fn into_table(self) -> Table {
        self.table
    }

    /// Check if `var` is part of the scope
    pub fn contains(&self, var: &Variable) -> bool {
        self.scope.binary_search(var).is_ok()
    }


    /// Retrieve the value for a configuration given positionally over the sorted scope
    ///
    /// # Errors
    /// * `FactorError::Scope` if `config` does not have one entry per scope `Variable`
    /// * `FactorError::Domain` if a state is out of range for its `Variable`
    pub fn value(&self, config: &[usize]) -> Result<f64> {
        self.check_config(config)?;
        Ok(self.table[nd::IxDyn(config)])
    }


    /// Overwrite the value for a configuration given positionally over the sorted scope
    ///
    /// # Errors
    /// see `value`
    pub fn set_value(&mut self, config: &[usize], value: f64) -> Result<()> {
        self.check_config(config)?;
        self.table[nd::IxDyn(config)] = value;
        Ok(())
    }


    /// Retrieve the value for a complete assignment over the scope of this `Factor`
    ///
    /// # Args
    /// assignment: a full assignment to the scope of a `Factor`. The assignment's scope may be a
    ///             superset of the `Factor`s scope.
    ///
    /// # Errors
    /// * `FactorError::Scope`, if assignment does not cover the scope of the `Factor`
    /// * `FactorError::Domain`, if an assigned state is out of range
    pub fn value_map(&self, assignment: &Assignment) -> Result<f64> {
        let config = self.config_of(assignment)?;
        self.value(&config)
    }


    /// Overwrite the value for a complete assignment over the scope of this `Factor`
    ///
    /// # Errors
    /// see `value_map`
    pub fn set_value_map(&mut self, assignment: &Assignment, value: f64) -> Result<()> {
        let config = self.config_of(assignment)?;
        self.set_value(&config, value)
    }


    fn config_of(&self, assignment: &Assignment) -> Result<Vec<usize>> {
        self.scope.iter()
                  .map(|v| assignment.get(v).cloned().ok_or_else(|| {
                      FactorError::scope(format!("Missing assignment to {}", v))
                  }))
                  .collect()
    }


    fn check_config(&self, config: &[usize]) -> Result<()> {
        if config.len() != self.scope.len() {
            return Err(FactorError::scope(format!(
                "Configuration has {} entries but scope has {} variables",
                config.len(), self.scope.len()
            )));
        }

        for (v, &s) in self.scope.iter().zip(config.iter()) {
            if s >= v.cardinality() {
                return Err(FactorError::domain(format!(
                    "State {} is out of range for {} with cardinality {}", s, v, v.cardinality()
                )));
            }
        }

        Ok(())
    }

}


impl fmt::Display for Factor {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ids: Vec<String> = self.scope.iter().map(|v| v.id().to_string()).collect();
        write!(f, "Factor({{{}}})", ids.join(","))
    }

}


/// Sort `scope` by id, rejecting duplicate `Variable`s
fn canonical_scope(mut scope: Vec<Variable>) -> Result<Vec<Variable>> {
    scope.sort();
    check_unique(scope.iter())?;
    Ok(scope)
}


/// Check that no two consecutive `Variable`s share an id
fn check_unique<'a, I>(sorted: I) -> Result<()>
    where I: Iterator<Item = &'a Variable>
{
    let mut last: Option<&Variable> = None;
    for v in sorted {
        if let Some(prev) = last {
            if prev.id() == v.id() {
                return Err(FactorError::scope(format!("{} appears more than once in scope", v)));
            }
        }
        last = Some(v);
    }

    Ok(())
}
