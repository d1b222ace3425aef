//! Setting category value object.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A category name was empty or whitespace-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Setting category name cannot be blank")]
pub struct BlankCategoryError;

/// Named grouping of settings. Equality is by exact (ordinal) name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SettingCategory(String);

impl SettingCategory {
    /// Creates a category from a non-blank name.
    ///
    /// # Errors
    ///
    /// Returns [`BlankCategoryError`] if `name` is empty or whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self, BlankCategoryError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(BlankCategoryError);
        }
        Ok(Self(name))
    }

    /// Returns the category name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SettingCategory {
    type Error = BlankCategoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SettingCategory> for String {
    fn from(category: SettingCategory) -> Self {
        category.0
    }
}

impl fmt::Display for SettingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
