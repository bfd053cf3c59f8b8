//! Collaborator error types and result alias.
//!
//! This module defines the error types produced by the device-registry and
//! user-store collaborators. All implementations must map their internal
//! errors to these standardized types.
//!
//! # Error Partition
//!
//! Registry errors are partitioned into client-caused and server-caused
//! failures:
//!
//! - [`RegistryError::Client`] - The request itself is at fault (e.g. unknown
//!   user, unknown device). Retrying will not help.
//! - [`RegistryError::Server`] - The registry backend failed (e.g. storage
//!   unavailable). Retryable at a higher layer.
//!
//! Consumers translating these errors into their own taxonomy must preserve
//! this partition.
//!
//! # Example
//!
//! ```
//! use finauth_common_registry::{RegistryError, RegistryResult};
//!
//! fn lookup(device_id: &str) -> RegistryResult<Vec<u8>> {
//!     Err(RegistryError::client(format!("unknown device: {device_id}")))
//! }
//! ```

use std::sync::Arc;

use thiserror::Error;

/// A boxed error type for source chain tracking.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for device-registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur during device-registry operations.
///
/// Errors preserve their source chain via the `#[source]` attribute, enabling
/// debugging tools to display the full error context.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]` — new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// The request was at fault (unknown user, unknown device, bad input).
    ///
    /// This is a terminal rejection; retrying the same request will fail the
    /// same way.
    #[error("Registry client error: {message}")]
    Client {
        /// Description of what was wrong with the request.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// The registry backend failed (storage unavailable, internal fault).
    ///
    /// Retryable at a higher layer once the backend recovers.
    #[error("Registry server error: {message}")]
    Server {
        /// Description of the backend failure.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// The registry operation exceeded its time limit.
    #[error("Registry operation timeout")]
    Timeout,
}

impl RegistryError {
    /// Creates a new `Client` error with the given message.
    #[must_use]
    pub fn client(message: impl Into<String>) -> Self {
        Self::Client { message: message.into(), source: None }
    }

    /// Creates a new `Client` error with a message and source error.
    #[must_use]
    pub fn client_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Client { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a new `Server` error with the given message.
    #[must_use]
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server { message: message.into(), source: None }
    }

    /// Creates a new `Server` error with a message and source error.
    #[must_use]
    pub fn server_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Server { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a new `Timeout` error.
    #[must_use]
    pub fn timeout() -> Self {
        Self::Timeout
    }

    /// Returns `true` if this error was caused by the request rather than
    /// the registry backend.
    #[must_use]
    pub fn is_client_caused(&self) -> bool {
        matches!(self, Self::Client { .. })
    }
}

/// Errors that can occur during user-store operations.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]` — new variants may be added in
/// future minor releases without a semver-breaking change.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UserStoreError {
    /// No user exists for the given login name in the given tenant domain.
    #[error("Unknown user: {subject}")]
    UnknownUser {
        /// The login name that could not be resolved.
        subject: String,
    },

    /// The user store backend failed.
    #[error("User store error: {message}")]
    Store {
        /// Description of the backend failure.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<BoxError>,
    },
}

impl UserStoreError {
    /// Creates a new `UnknownUser` error for the given login name.
    #[must_use]
    pub fn unknown_user(subject: impl Into<String>) -> Self {
        Self::UnknownUser { subject: subject.into() }
    }

    /// Creates a new `Store` error with the given message.
    #[must_use]
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store { message: message.into(), source: None }
    }

    /// Creates a new `Store` error with a message and source error.
    #[must_use]
    pub fn store_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Store { message: message.into(), source: Some(Arc::new(source)) }
    }
}
