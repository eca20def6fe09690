//! Error types for timelines, instances and the animation manager

use lilt_api_core::PropertyError;

/// Errors raised while configuring or evaluating animations.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AnimationError {
    /// A parameter was set to a value outside its valid range.
    #[error("{name} is out of range: {reason}")]
    ArgumentOutOfRange { name: &'static str, reason: String },

    /// The animation cannot be evaluated in its current configuration.
    #[error("invalid animation: {0}")]
    InvalidAnimation(String),

    /// The operation is not allowed on this object or in its current state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A target property rejected an access.
    #[error(transparent)]
    Property(#[from] PropertyError),

    /// Configuration could not be parsed.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl AnimationError {
    pub(crate) fn out_of_range(name: &'static str, reason: impl Into<String>) -> Self {
        Self::ArgumentOutOfRange {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidAnimation(message.into())
    }

    pub(crate) fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }

    /// True for errors raised at the mutation site (bad configuration).
    #[inline]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::ArgumentOutOfRange { .. } | Self::InvalidConfig(_))
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::ArgumentOutOfRange { .. } => "range",
            Self::InvalidAnimation(_) => "evaluation",
            Self::InvalidOperation(_) => "operation",
            Self::Property(_) => "property",
            Self::InvalidConfig(_) => "config",
        }
    }
}

impl From<serde_json::Error> for AnimationError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

/// Ensure `value` is finite and non-negative.
pub(crate) fn check_non_negative(name: &'static str, value: f32) -> Result<f32, AnimationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AnimationError::out_of_range(
            name,
            format!("must be finite and non-negative, got {value}"),
        ));
    }
    Ok(value)
}

/// Ensure `value` is not NaN.
pub(crate) fn check_not_nan(name: &'static str, value: f32) -> Result<f32, AnimationError> {
    if value.is_nan() {
        return Err(AnimationError::out_of_range(name, "must not be NaN"));
    }
    Ok(value)
}
