//! Typed setting values and setting/value pairing.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

use super::{Setting, SettingId, SettingKind};

/// A value of one of the supported kinds.
///
/// This is what crosses the provider boundary before a value is paired
/// with its definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// UTC timestamp
    DateTime(DateTime<Utc>),
    /// Text, possibly null
    String(Option<String>),
}

impl Value {
    /// Returns the kind of this value.
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

    /// Parses text into a value of the given kind.
    ///
    /// Date-times are RFC 3339. Floats must be finite. Strings are taken
    /// verbatim and are never null.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BadRequest`] if `text` is not a valid literal
    /// of `kind`.
    pub fn parse(kind: SettingKind, text: &str) -> Result<Self, SettingsError> {
        let invalid = |reason: String| {
            SettingsError::BadRequest(format!("'{text}' is not a valid {kind}: {reason}"))
        };

        match kind {
            SettingKind::Boolean => text
                .trim()
                .parse()
                .map(Self::Boolean)
                .map_err(|e| invalid(e.to_string())),
            SettingKind::Integer => text
                .trim()
                .parse()
                .map(Self::Integer)
                .map_err(|e| invalid(e.to_string())),
            SettingKind::Float => match text.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(Self::Float(v)),
                Ok(_) => Err(invalid("not a finite number".to_string())),
                Err(e) => Err(invalid(e.to_string())),
            },
            SettingKind::DateTime => DateTime::parse_from_rfc3339(text.trim())
                .map(|dt| Self::DateTime(dt.with_timezone(&Utc)))
                .map_err(|e| invalid(e.to_string())),
            SettingKind::String => Ok(Self::String(Some(text.to_string()))),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
            Self::String(Some(v)) => f.write_str(v),
            Self::String(None) => f.write_str("null"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(Some(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(Some(value.to_string()))
    }
}

impl From<Option<String>> for Value {
    fn from(value: Option<String>) -> Self {
        Self::String(value)
    }
}

/// Rust types that can be extracted from a [`Value`] of a specific kind.
///
/// `String` extracts only non-null text; use `Option<String>` to observe
/// nulls.
pub trait SettingType: Sized + Into<Value> {
    /// The kind a setting must declare to hold this type.
    const KIND: SettingKind;

    /// Extracts `Self` from a value, or `None` if the value is of another kind.
    fn from_value(value: &Value) -> Option<Self>;
}

impl SettingType for bool {
    const KIND: SettingKind = SettingKind::Boolean;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

impl SettingType for i64 {
    const KIND: SettingKind = SettingKind::Integer;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }
}

impl SettingType for f64 {
    const KIND: SettingKind = SettingKind::Float;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl SettingType for DateTime<Utc> {
    const KIND: SettingKind = SettingKind::DateTime;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::DateTime(v) => Some(*v),
            _ => None,
        }
    }
}

impl SettingType for String {
    const KIND: SettingKind = SettingKind::String;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(v) => v.clone(),
            _ => None,
        }
    }
}

impl SettingType for Option<String> {
    const KIND: SettingKind = SettingKind::String;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// A stored value for one setting id.
///
/// The id is a loose reference: the setting may not exist (yet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingValue {
    /// Id of the setting this value belongs to
    pub setting_id: SettingId,
    /// The stored value
    pub value: Value,
}

impl SettingValue {
    /// Creates a setting value.
    #[must_use]
    pub fn new(setting_id: SettingId, value: impl Into<Value>) -> Self {
        Self {
            setting_id,
            value: value.into(),
        }
    }

    /// Returns the untyped value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Returns the kind of the stored value.
    #[must_use]
    pub const fn kind(&self) -> SettingKind {
        self.value.kind()
    }

    /// Extracts the value as `T`, or `None` if the kinds differ.
    #[must_use]
    pub fn value_as<T: SettingType>(&self) -> Option<T> {
        T::from_value(&self.value)
    }

    /// Pairs this value with its setting definition.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Internal`] if the ids differ or the
    /// setting declares another kind; both mean stored data disagrees with
    /// the catalog.
    pub fn to_setting_value_pair(&self, setting: &Setting) -> Result<SettingValuePair, SettingsError> {
        if self.setting_id != setting.id {
            return Err(SettingsError::Internal(format!(
                "The setting id {} does not match the setting value id {}.",
                setting.id, self.setting_id
            )));
        }
        if self.kind() != setting.kind() {
            return Err(SettingsError::Internal(format!(
                "Setting {} of kind {} cannot be paired with a value of kind {}.",
                setting.id,
                setting.kind(),
                self.kind()
            )));
        }

        Ok(SettingValuePair {
            setting: setting.clone(),
            value: self.value.clone(),
        })
    }
}

/// A setting bound to a value of its declared kind.
///
/// Used for presentation and editing; it carries no storage identity of
/// its own.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingValuePair {
    setting: Setting,
    value: Value,
}

impl SettingValuePair {
    /// Pairs `setting` with `value`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::TypeMismatch`] if the value's kind differs
    /// from the setting's declared kind.
    pub fn new(setting: Setting, value: impl Into<Value>) -> Result<Self, SettingsError> {
        let value = value.into();
        if value.kind() != setting.kind() {
            return Err(SettingsError::TypeMismatch {
                setting_id: setting.id,
                expected: value.kind(),
                actual: setting.kind(),
            });
        }
        Ok(Self { setting, value })
    }

    /// Pairs `setting` with its own default, which always has the declared kind.
    pub(super) fn from_default(setting: Setting) -> Self {
        let value = setting.default_value();
        Self { setting, value }
    }

    /// Returns the paired setting definition.
    #[must_use]
    pub const fn setting(&self) -> &Setting {
        &self.setting
    }

    /// Returns the current value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Extracts the current value as `T`.
    #[must_use]
    pub fn value_as<T: SettingType>(&self) -> Option<T> {
        T::from_value(&self.value)
    }

    /// Builds the storable value for this pair.
    #[must_use]
    pub fn setting_value(&self) -> SettingValue {
        SettingValue {
            setting_id: self.setting.id,
            value: self.value.clone(),
        }
    }

    /// Replaces the current value without running the setting's rules.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::TypeMismatch`] if `value` is of another kind.
    pub fn set_value(&mut self, value: impl Into<Value>) -> Result<(), SettingsError> {
        let value = value.into();
        if value.kind() != self.setting.kind() {
            return Err(SettingsError::TypeMismatch {
                setting_id: self.setting.id,
                expected: value.kind(),
                actual: self.setting.kind(),
            });
        }
        self.value = value;
        Ok(())
    }
}
