//! Defines the `Error` type for the tablefactor library

use std::result;

use thiserror::Error;

pub type Result<T> = result::Result<T, FactorError>;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum FactorError {

    /// A `Variable` was referenced that is not part of the `Factor`'s scope, or a positional
    /// index did not line up with the scope
    #[error("Invalid scope: {0}")]
    Scope(String),

    /// A table or value list did not match the shape implied by the scope
    #[error("Invalid shape: {0}")]
    Shape(String),

    /// An operator parameter or table content is outside of the operator's domain
    #[error("Invalid domain: {0}")]
    Domain(String),

}

impl FactorError {

    pub(crate) fn scope<S: Into<String>>(msg: S) -> Self {
        FactorError::Scope(msg.into())
    }

    pub(crate) fn shape<S: Into<String>>(msg: S) -> Self {
        FactorError::Shape(msg.into())
    }

    pub(crate) fn domain<S: Into<String>>(msg: S) -> Self {
        FactorError::Domain(msg.into())
    }

}
