//! Outcome of checking a value or a setting's own parameters.

/// Result of a validation check.
///
/// An `Invalid` result always carries at least one reason.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValidationResult {
    /// The checked input satisfies every rule.
    #[default]
    Valid,
    /// The checked input violated one or more rules.
    Invalid(Vec<String>),
}

/// Result of [`Setting::validate_internal_parameters`](super::Setting::validate_internal_parameters).
pub type ParameterValidationResult = ValidationResult;

impl ValidationResult {
    /// Creates an invalid result with a single reason.
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid(vec![reason.into()])
    }

    /// Returns `true` if no rule was violated.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Returns the violation reasons (empty when valid).
    #[must_use]
    pub fn errors(&self) -> &[String] {
        match self {
            Self::Valid => &[],
            Self::Invalid(reasons) => reasons,
        }
    }
}
