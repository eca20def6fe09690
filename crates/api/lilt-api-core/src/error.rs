use thiserror::Error;

/// Errors raised by property capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    /// The property has no base-value accessor.
    #[error("base value is not implemented for this property")]
    NotImplemented,
    /// The property holds a different value type than requested.
    #[error("property value type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}
