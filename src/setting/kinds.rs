//! Setting definitions and the per-kind validation rules.

use std::fmt::Display;

use chrono::{DateTime, Utc};

use super::{
    ParameterValidationResult, SettingCategory, SettingId, SettingKind, SettingValuePair,
    ValidationResult, Value,
};

/// A named, typed configuration key.
///
/// The declared kind is fixed by [`SettingRules`]; the rules also carry the
/// default value.
#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    /// Identity, `0` until persisted
    pub id: SettingId,
    /// Unique, non-blank name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Optional grouping
    pub category: Option<SettingCategory>,
    /// Whether a value must be provided
    pub is_required: bool,
    /// Whether the value may be edited
    pub is_read_only: bool,
    /// Kind-specific rules and default
    pub rules: SettingRules,
}

impl Setting {
    /// Creates an unpersisted setting with the given name and rules.
    #[must_use]
    pub fn new(name: impl Into<String>, rules: impl Into<SettingRules>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: String::new(),
            category: None,
            is_required: false,
            is_read_only: false,
            rules: rules.into(),
        }
    }

    /// Sets the id.
    #[must_use]
    pub const fn with_id(mut self, id: SettingId) -> Self {
        self.id = id;
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: SettingCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Marks the setting as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// Marks the setting as read-only.
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.is_read_only = true;
        self
    }

    /// Returns the declared kind.
    #[must_use]
    pub const fn kind(&self) -> SettingKind {
        self.rules.kind()
    }

    /// Returns the default value.
    #[must_use]
    pub fn default_value(&self) -> Value {
        self.rules.default_value()
    }

    /// Pairs this setting with its own default.
    #[must_use]
    pub fn default_setting_value_pair(&self) -> SettingValuePair {
        SettingValuePair::from_default(self.clone())
    }

    /// Checks `value` against this setting's rules.
    ///
    /// A value of another kind is always invalid.
    #[must_use]
    pub fn validate_value(&self, value: &Value) -> ValidationResult {
        match (&self.rules, value) {
            (SettingRules::Boolean(_), Value::Boolean(_)) => ValidationResult::Valid,
            (SettingRules::Integer(rules), Value::Integer(v)) => rules.validate(v),
            (SettingRules::Float(_), Value::Float(v)) if !v.is_finite() => {
                ValidationResult::invalid(format!("The value, {v}, is not a finite number."))
            }
            (SettingRules::Float(rules), Value::Float(v)) => rules.validate(v),
            (SettingRules::DateTime(rules), Value::DateTime(v)) => rules.validate(v),
            (SettingRules::String(rules), Value::String(v)) => rules.validate(v.as_deref()),
            (rules, value) => ValidationResult::invalid(format!(
                "Unable to set a value of kind {} to a setting of kind {}.",
                value.kind(),
                rules.kind()
            )),
        }
    }

    /// Checks that the configured rules are self-consistent.
    #[must_use]
    pub fn validate_internal_parameters(&self) -> ParameterValidationResult {
        match &self.rules {
            SettingRules::Boolean(_) => ParameterValidationResult::Valid,
            SettingRules::Integer(rules) => rules.validate_parameters(),
            SettingRules::Float(rules) => {
                let numbers = [
                    Some(&rules.default_value),
                    rules.min_value.as_ref(),
                    rules.max_value.as_ref(),
                ];
                if numbers.into_iter().flatten().any(|v| !v.is_finite()) {
                    ParameterValidationResult::invalid("float rules must use finite numbers")
                } else {
                    rules.validate_parameters()
                }
            }
            SettingRules::DateTime(rules) => rules.validate_parameters(),
            SettingRules::String(rules) => rules.validate_parameters(),
        }
    }
}

/// Kind-specific rules of a setting.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingRules {
    /// Boolean setting
    Boolean(BooleanRules),
    /// Integer setting
    Integer(BoundedRules<i64>),
    /// Float setting
    Float(BoundedRules<f64>),
    /// Date-time setting
    DateTime(BoundedRules<DateTime<Utc>>),
    /// String setting
    String(StringRules),
}

impl SettingRules {
    /// Returns the kind these rules declare.
    #[must_use]
    pub const fn kind(&self) -> SettingKind {
        match self {
            Self::Boolean(_) => SettingKind::Boolean,
            Self::Integer(_) => SettingKind::Integer,
            Self::Float(_) => SettingKind::Float,
            Self::DateTime(_) => SettingKind::DateTime,
            Self::String(_) => SettingKind::String,
        }
    }

    /// Returns the default value.
    #[must_use]
    pub fn default_value(&self) -> Value {
        match self {
            Self::Boolean(rules) => Value::Boolean(rules.default_value),
            Self::Integer(rules) => Value::Integer(rules.default_value),
            Self::Float(rules) => Value::Float(rules.default_value),
            Self::DateTime(rules) => Value::DateTime(rules.default_value),
            Self::String(rules) => Value::String(rules.default_value.clone()),
        }
    }
}

impl From<BooleanRules> for SettingRules {
    fn from(rules: BooleanRules) -> Self {
        Self::Boolean(rules)
    }
}

impl From<BoundedRules<i64>> for SettingRules {
    fn from(rules: BoundedRules<i64>) -> Self {
        Self::Integer(rules)
    }
}

impl From<BoundedRules<f64>> for SettingRules {
    fn from(rules: BoundedRules<f64>) -> Self {
        Self::Float(rules)
    }
}

impl From<BoundedRules<DateTime<Utc>>> for SettingRules {
    fn from(rules: BoundedRules<DateTime<Utc>>) -> Self {
        Self::DateTime(rules)
    }
}

impl From<StringRules> for SettingRules {
    fn from(rules: StringRules) -> Self {
        Self::String(rules)
    }
}

/// Rules of a boolean setting. Every boolean is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BooleanRules {
    /// Default value
    pub default_value: bool,
}

impl BooleanRules {
    /// Creates boolean rules with the given default.
    #[must_use]
    pub const fn new(default_value: bool) -> Self {
        Self { default_value }
    }
}

/// Rules of an ordered kind (integer, float, date-time).
///
/// A non-empty allow-list replaces the bounds check entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedRules<T> {
    /// Default value
    pub default_value: T,
    /// Inclusive lower bound
    pub min_value: Option<T>,
    /// Inclusive upper bound
    pub max_value: Option<T>,
    /// Exhaustive list of accepted values, ignored when empty
    pub allowed_values: Vec<T>,
}

impl<T> BoundedRules<T> {
    /// Creates unbounded rules with the given default.
    #[must_use]
    pub const fn new(default_value: T) -> Self {
        Self {
            default_value,
            min_value: None,
            max_value: None,
            allowed_values: Vec::new(),
        }
    }

    /// Sets the inclusive lower bound.
    #[must_use]
    pub fn with_min(mut self, min: T) -> Self {
        self.min_value = Some(min);
        self
    }

    /// Sets the inclusive upper bound.
    #[must_use]
    pub fn with_max(mut self, max: T) -> Self {
        self.max_value = Some(max);
        self
    }

    /// Sets the allow-list.
    #[must_use]
    pub fn with_allowed(mut self, allowed: impl IntoIterator<Item = T>) -> Self {
        self.allowed_values = allowed.into_iter().collect();
        self
    }
}

impl<T: PartialOrd + Display> BoundedRules<T> {
    fn validate(&self, value: &T) -> ValidationResult {
        if !self.allowed_values.is_empty() {
            return if self.allowed_values.iter().any(|allowed| allowed == value) {
                ValidationResult::Valid
            } else {
                ValidationResult::invalid(format!(
                    "The value, {value}, is not in the allowed set of values: {}.",
                    join(&self.allowed_values)
                ))
            };
        }
        if let Some(max) = &self.max_value {
            if value > max {
                return ValidationResult::invalid(format!(
                    "The value, {value}, exceeds the max of {max}."
                ));
            }
        }
        if let Some(min) = &self.min_value {
            if value < min {
                return ValidationResult::invalid(format!(
                    "The value, {value}, is below the min of {min}."
                ));
            }
        }
        ValidationResult::Valid
    }

    fn validate_parameters(&self) -> ParameterValidationResult {
        match (&self.min_value, &self.max_value) {
            (Some(min), Some(max)) if min > max => {
                ParameterValidationResult::invalid("min_value can not be greater than max_value")
            }
            _ => ParameterValidationResult::Valid,
        }
    }
}

/// Rules of a string setting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StringRules {
    /// Default value, `None` for null
    pub default_value: Option<String>,
    /// Whether null is accepted
    pub allow_null: bool,
    /// Whether empty and whitespace-only text is accepted
    pub allow_empty_strings: bool,
    /// Minimum length in characters
    pub min_characters: Option<i32>,
    /// Maximum length in characters
    pub max_characters: Option<i32>,
    /// Exhaustive list of accepted values, ignored when empty
    pub allowed_values: Vec<String>,
}

impl StringRules {
    /// Creates string rules with a non-null default.
    #[must_use]
    pub fn new(default_value: impl Into<String>) -> Self {
        Self {
            default_value: Some(default_value.into()),
            ..Self::default()
        }
    }

    /// Allows null values.
    #[must_use]
    pub const fn allowing_null(mut self) -> Self {
        self.allow_null = true;
        self
    }

    /// Allows empty and whitespace-only values.
    #[must_use]
    pub const fn allowing_empty(mut self) -> Self {
        self.allow_empty_strings = true;
        self
    }

    /// Sets the length bounds.
    #[must_use]
    pub const fn with_length(mut self, min: Option<i32>, max: Option<i32>) -> Self {
        self.min_characters = min;
        self.max_characters = max;
        self
    }

    /// Sets the allow-list.
    #[must_use]
    pub fn with_allowed<S: Into<String>>(mut self, allowed: impl IntoIterator<Item = S>) -> Self {
        self.allowed_values = allowed.into_iter().map(Into::into).collect();
        self
    }

    fn validate(&self, value: Option<&str>) -> ValidationResult {
        let Some(value) = value else {
            return if self.allow_null {
                ValidationResult::Valid
            } else {
                ValidationResult::invalid("The string value cannot be null.")
            };
        };

        if !self.allowed_values.is_empty() {
            return if self.allowed_values.iter().any(|allowed| allowed == value) {
                ValidationResult::Valid
            } else {
                ValidationResult::invalid(format!(
                    "The value, {value}, is not in the allowed set of values: {}.",
                    join(&self.allowed_values)
                ))
            };
        }

        let length = i64::try_from(value.chars().count()).unwrap_or(i64::MAX);
        if let Some(max) = self.max_characters {
            if length > i64::from(max) {
                return ValidationResult::invalid(format!(
                    "The value, {value}, exceeds the character limit of {max}."
                ));
            }
        }
        if let Some(min) = self.min_characters {
            if length < i64::from(min) {
                return ValidationResult::invalid(format!(
                    "The value, {value}, is below the character limit of {min}."
                ));
            }
        }
        if !self.allow_empty_strings && value.trim().is_empty() {
            return ValidationResult::invalid("Strings of only whitespace are not allowed.");
        }

        ValidationResult::Valid
    }

    fn validate_parameters(&self) -> ParameterValidationResult {
        if self.max_characters.is_some_and(|max| max <= 0) {
            return ParameterValidationResult::invalid(
                "Max characters can not be less than or equal to 0.",
            );
        }
        if self.min_characters.is_some_and(|min| min <= 0) {
            return ParameterValidationResult::invalid(
                "Min characters can not be less than or equal to 0.",
            );
        }
        if let (Some(min), Some(max)) = (self.min_characters, self.max_characters) {
            if min > max {
                return ParameterValidationResult::invalid(
                    "Min characters can not be greater than the max characters allowed.",
                );
            }
        }
        ParameterValidationResult::Valid
    }
}

fn join<T: Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
