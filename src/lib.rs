//! Discrete table factors for probabilistic graphical models.
//!
//! A `Factor` maps every joint configuration of a set of discrete `Variable`s to a value. Factors
//! can be combined arithmetically over differing scopes, have variables eliminated, conditioned,
//! optimized and sampled.

#[cfg_attr(test, macro_use)]
extern crate itertools;
#[cfg_attr(test, macro_use)]
extern crate ndarray;

pub mod variable;
pub mod factor;
pub mod util;

pub use factor::{Distance, Factor, Table};
pub use util::{Result, FactorError};
pub use variable::{all_assignments, Assignment, Variable};
