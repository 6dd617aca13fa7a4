//! Definition of the variable module
//!
//! A `Variable` represents a discrete random variable in a Probabilistic Graphical Model. An
//! `Assignment` maps `Variable`s to one of their states.

use crate::util::{FactorError, Result};

use indexmap::IndexMap;
use indexmap::map::Iter;
use itertools::Itertools;

use std::cmp::Ordering;
use std::fmt;
use std::iter::{self, FromIterator};


/// A discrete random variable. States are numbered `0..cardinality`.
///
/// `Variable`s are small immutable values; `Factor`s hold copies of them rather than references.
/// They are ordered by `id`, which is the order every `Factor` keeps its scope in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Variable {
    /// The identifier of the `Variable`, unique within a model
    id: usize,

    /// The number of states of the `Variable`
    cardinality: usize
}

impl Variable {

    /// Construct a new `Variable`
    ///
    /// # Errors
    /// * `FactorError::Domain` if `cardinality` is zero
    pub fn new(id: usize, cardinality: usize) -> Result<Self> {
        if cardinality == 0 {
            return Err(FactorError::domain(
                format!("Variable {} must have at least one state", id)
            ));
        }

        Ok(Variable { id, cardinality })
    }

    /// Construct a new two-state `Variable`
    pub fn binary(id: usize) -> Self {
        Variable { id, cardinality: 2 }
    }

    /// Get the identifier of the `Variable`
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get the number of states of the `Variable`
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

}

impl Ord for Variable {

    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id).then(self.cardinality.cmp(&other.cardinality))
    }

}

impl PartialOrd for Variable {

    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }

}

impl fmt::Display for Variable {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "X{}", self.id)
    }

}


/// A (possibly partial) assignment of states to `Variable`s.
///
/// Iteration follows insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Assignment {
    values: IndexMap<Variable, usize>
}

impl Assignment {

    /// Construct an empty `Assignment`
    pub fn new() -> Self {
        Assignment { values: IndexMap::new() }
    }

    /// Assign `value` to `var`, replacing any previous assignment
    pub fn set(&mut self, var: &Variable, value: usize) {
        self.values.insert(*var, value);
    }

    /// Remove the assignment to `var`, if any
    pub fn unset(&mut self, var: &Variable) {
        self.values.shift_remove(var);
    }

    /// Get the value assigned to `var`
    pub fn get(&self, var: &Variable) -> Option<&usize> {
        self.values.get(var)
    }

    /// Number of assigned `Variable`s
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The assigned `Variable`s, in insertion order
    pub fn vars(&self) -> Vec<Variable> {
        self.values.keys().cloned().collect()
    }

    pub fn iter(&self) -> Iter<Variable, usize> {
        self.values.iter()
    }

}

impl From<Vec<(Variable, usize)>> for Assignment {

    fn from(pairs: Vec<(Variable, usize)>) -> Self {
        pairs.into_iter().collect()
    }

}

impl FromIterator<(Variable, usize)> for Assignment {

    fn from_iter<I: IntoIterator<Item = (Variable, usize)>>(iter: I) -> Self {
        Assignment { values: iter.into_iter().collect() }
    }

}

impl<'a> IntoIterator for &'a Assignment {

    type Item = (&'a Variable, &'a usize);
    type IntoIter = Iter<'a, Variable, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }

}


/// Enumerate every complete `Assignment` to `scope`.
///
/// Assignments are produced in row-major order: the last `Variable` of `scope` changes fastest.
/// An empty scope has exactly one (empty) assignment.
pub fn all_assignments(scope: &[Variable]) -> Box<dyn Iterator<Item = Assignment>> {
    if scope.is_empty() {
        return Box::new(iter::once(Assignment::new()));
    }

    let vars = scope.to_vec();
    let it = scope.iter()
                  .map(|v| 0..v.cardinality())
                  .multi_cartesian_product()
                  .map(move |states| vars.iter().cloned().zip(states).collect());

    Box::new(it)
}
