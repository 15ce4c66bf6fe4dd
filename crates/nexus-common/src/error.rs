//! Error types for the Nexus operator
//!
//! Errors carry the instance name and, where relevant, the resource kind so
//! that a failed reconciliation pass can be traced back to the object that
//! caused it. Not-found lookups are never errors; they surface as `None`.

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for Nexus reconciliation
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Invalid or incomplete Nexus spec
    #[error("validation error for {instance}: {message}")]
    Validation {
        /// Name of the Nexus instance with invalid configuration
        instance: String,
        /// Description of what's invalid
        message: String,
        /// The invalid field path (e.g., "spec.networking.host")
        field: Option<String>,
    },

    /// The requested exposure needs a resource kind the cluster does not serve
    #[error("{kind} is not available on this cluster (required by {instance})")]
    CapabilityUnavailable {
        /// Name of the Nexus instance requesting the kind
        instance: String,
        /// The missing resource kind (e.g., "Route")
        kind: String,
    },

    /// Reading deployed state failed for a reason other than not-found
    #[error("failed to fetch {kind} for {instance}: {message}")]
    Fetch {
        /// Resource kind being fetched
        kind: String,
        /// Name of the Nexus instance
        instance: String,
        /// Description of what failed
        message: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The resource kind being serialized (if known)
        kind: Option<String>,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Context where the error occurred (e.g., "supervisor", "discovery")
        context: String,
    },
}

impl Error {
    /// Create a validation error with the given message
    ///
    /// For simple validation errors without instance context.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            instance: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error with instance context
    pub fn validation_for(instance: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            instance: instance.into(),
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error with instance context and field path
    pub fn validation_for_field(
        instance: impl Into<String>,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Validation {
            instance: instance.into(),
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a capability error for a kind the platform does not serve
    pub fn capability_unavailable(instance: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::CapabilityUnavailable {
            instance: instance.into(),
            kind: kind.into(),
        }
    }

    /// Create a fetch error with kind and instance context
    pub fn fetch(
        kind: impl Into<String>,
        instance: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Fetch {
            kind: kind.into(),
            instance: instance.into(),
            message: msg.into(),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error for a specific resource kind
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Create an internal error with the given message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: UNKNOWN_CONTEXT.to_string(),
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Returns true if the failure may clear up on a later pass
    ///
    /// Configuration problems (validation, missing capabilities, malformed
    /// objects) stay broken until the user edits the spec or the cluster.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube { .. } => true,
            Error::Fetch { .. } => true,
            Error::Internal { .. } => true,
            Error::Validation { .. } => false,
            Error::CapabilityUnavailable { .. } => false,
            Error::Serialization { .. } => false,
        }
    }

    /// Get the instance name associated with this error, if any
    pub fn instance(&self) -> Option<&str> {
        match self {
            Error::Validation { instance, .. }
            | Error::CapabilityUnavailable { instance, .. }
            | Error::Fetch { instance, .. } => Some(instance),
            _ => None,
        }
    }

    /// Get the field path for validation errors
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }

    /// Get the resource kind associated with this error, if any
    pub fn kind(&self) -> Option<&str> {
        match self {
            Error::CapabilityUnavailable { kind, .. } | Error::Fetch { kind, .. } => Some(kind),
            Error::Serialization { kind, .. } => kind.as_deref(),
            _ => None,
        }
    }
}
