//! Setting definitions, values and their validation rules.
//!
//! The kind set is closed: every setting is one of [`SettingKind`], its
//! rules live in a matching [`SettingRules`] variant, and every value is a
//! matching [`Value`] variant. Dispatch is by exhaustive `match`.

mod category;
mod kinds;
mod validation;
mod value;


use std::fmt;

use serde::{Deserialize, Serialize};

pub use category::{BlankCategoryError, SettingCategory};
pub use kinds::{BooleanRules, BoundedRules, Setting, SettingRules, StringRules};
pub use validation::{ParameterValidationResult, ValidationResult};
pub use value::{SettingType, SettingValue, SettingValuePair, Value};

/// Identifier of a setting definition. `0` means "not yet persisted".
pub type SettingId = i64;

/// The closed set of setting kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKind {
    /// `true` / `false`
    Boolean,
    /// Signed 64-bit integer
    Integer,
    /// 64-bit floating point
    Float,
    /// UTC timestamp
    DateTime,
    /// Optional UTF-8 text
    String,
}

impl SettingKind {
    /// Returns the lowercase name used in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::DateTime => "date_time",
            Self::String => "string",
        }
    }
}

impl fmt::Display for SettingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
