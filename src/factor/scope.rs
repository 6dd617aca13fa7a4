//! Scope algebra shared by the `Factor` operations.
//!
//! Scopes are slices of `Variable`s sorted by id. Binary operations compute the union of two
//! scopes and view each operand's table in the union's axis order; elimination and conditioning
//! map a set of `Variable`s onto axis positions of a scope.

use super::Factor;
use crate::util::{FactorError, Result};
use crate::variable::Variable;

use itertools::Itertools;
use ndarray::prelude as nd;


/// The sorted union of two sorted scopes
///
/// # Errors
/// * `FactorError::Scope` if the scopes hold a `Variable` with the same id but different
///   cardinalities
pub fn union(a: &[Variable], b: &[Variable]) -> Result<Vec<Variable>> {
    let scope: Vec<Variable> = a.iter().merge(b.iter()).dedup().cloned().collect();

    // same id sorts adjacent, so a surviving pair differs only in cardinality
    if let Some(w) = scope.windows(2).find(|w| w[0].id() == w[1].id()) {
        return Err(FactorError::scope(format!(
            "{} has cardinality {} in one scope and {} in the other", w[0], w[0].cardinality(), w[1].cardinality()
        )));
    }

    Ok(scope)
}

/// The `Variable`s of sorted scope `a` that are not in `b`
pub fn difference(a: &[Variable], b: &[Variable]) -> Vec<Variable> {
    a.iter().filter(|v| !b.contains(v)).cloned().collect()
}

/// The `Variable`s of sorted scope `a` that are also in `b`
pub fn intersection(a: &[Variable], b: &[Variable]) -> Vec<Variable> {
    a.iter().filter(|v| b.contains(v)).cloned().collect()
}

/// Check if every `Variable` of `a` is in sorted scope `b`
pub fn is_subset(a: &[Variable], b: &[Variable]) -> bool {
    a.iter().all(|v| b.binary_search(v).is_ok())
}

/// The table shape of a scope
pub fn shape(scope: &[Variable]) -> Vec<usize> {
    scope.iter().map(|v| v.cardinality()).collect()
}


/// Map `vars` onto axis positions of sorted scope `scope`
///
/// The result is sorted and free of duplicates, whatever the order of `vars`.
///
/// # Errors
/// * `FactorError::Scope` if a `Variable` of `vars` is not in `scope`
pub fn axes_of(scope: &[Variable], vars: &[Variable]) -> Result<Vec<usize>> {
    let mut axes = vars.iter()
                       .map(|v| scope.binary_search(v).map_err(|_| {
                           FactorError::scope(format!("{} is not in the scope of the factor", v))
                       }))
                       .collect::<Result<Vec<usize>>>()?;

    axes.sort();
    axes.dedup();
    Ok(axes)
}


/// View the table of `factor` in the axis order of `scope`, a superset of the factor's scope.
///
/// Axes for `Variable`s missing from `factor` are inserted with length one, so the result can be
/// broadcast to `shape(scope)`. Both scopes are sorted, so the factor's own axes are already in
/// the right relative order.
pub(crate) fn align<'a>(factor: &'a Factor, scope: &[Variable]) -> nd::ArrayViewD<'a, f64> {
    debug_assert!(is_subset(&factor.scope, scope));

    let mut view = factor.table.view();
    for (axis, v) in scope.iter().enumerate() {
        if !factor.contains(v) {
            view = view.insert_axis(nd::Axis(axis));
        }
    }

    view
}
