//! Error type shared by every settings operation.
//!
//! Each failure carries an HTTP-like status class so callers can tell
//! client-input problems apart from missing data and upstream faults.

use http::StatusCode;
use thiserror::Error;

use crate::setting::{SettingId, SettingKind};

/// Classified failure returned by catalogs, resolvers, services and providers.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A value failed its setting's validation rules.
    #[error("{message}: {}", reasons.join(", "))]
    Validation {
        /// Summary of the failed operation
        message: String,
        /// Human-readable reasons reported by the rules
        reasons: Vec<String>,
    },

    /// A setting's own parameters are not self-consistent.
    #[error("Setting parameters are invalid: {}", reasons.join(", "))]
    InvalidParameters {
        /// Human-readable reasons reported by the parameter check
        reasons: Vec<String>,
    },

    /// The caller asked for a type the setting does not declare.
    #[error("Setting {setting_id} is of kind {actual}, which does not support {expected}")]
    TypeMismatch {
        /// Setting that was queried
        setting_id: SettingId,
        /// Kind the caller expected
        expected: SettingKind,
        /// Kind the setting or value actually has
        actual: SettingKind,
    },

    /// Generic client-input rejection.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The requested setting or value does not exist.
    #[error("{what} with id {id} not found")]
    NotFound {
        /// What was looked up ("Setting", "Setting value")
        what: &'static str,
        /// The id that was not found
        id: SettingId,
    },

    /// The operation would violate a uniqueness constraint.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The operation is not supported by this component.
    #[error("{operation} is not implemented by {component}")]
    NotImplemented {
        /// Operation that was attempted
        operation: &'static str,
        /// Component that refused it
        component: &'static str,
    },

    /// Configuration or data invariant was violated.
    #[error("Internal error: {0}")]
    Internal(String),

    /// A value provider reported a failure.
    #[error("Provider '{provider}' failed ({status}): {message}")]
    Provider {
        /// Provider name for diagnostics
        provider: String,
        /// Status class chosen by the provider
        status: StatusCode,
        /// Provider message
        message: String,
    },

    /// Backing storage could not be read or written.
    #[error("Storage error: {message}")]
    Storage {
        /// What the storage layer was doing
        message: String,
        /// Underlying cause
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SettingsError {
    /// Returns the HTTP-like status class of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. }
            | Self::InvalidParameters { .. }
            | Self::TypeMismatch { .. }
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotImplemented { .. } => StatusCode::NOT_IMPLEMENTED,
            Self::Internal(_) | Self::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Provider { status, .. } => *status,
        }
    }

    /// Returns `true` for not-found failures, including providers that
    /// report a 404 status.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == StatusCode::NOT_FOUND
    }

    /// Creates a `NotFound` error for a setting definition.
    #[must_use]
    pub const fn setting_not_found(id: SettingId) -> Self {
        Self::NotFound { what: "Setting", id }
    }

    /// Creates a `NotFound` error for a setting value.
    #[must_use]
    pub const fn value_not_found(id: SettingId) -> Self {
        Self::NotFound {
            what: "Setting value",
            id,
        }
    }

    /// Wraps a storage-layer error.
    pub fn storage(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Box::new(source),
        }
    }
}
