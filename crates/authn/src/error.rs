//! Authentication error types.
//!
//! This module defines the failure taxonomy for device verification. Every
//! rejection carries a stable machine-readable kind (see [`AuthError::kind`])
//! surfaced to the calling framework, while the `Display` message holds the
//! internal detail that goes to logs. Collaborator errors are wrapped with
//! their source chain preserved but are never leaked verbatim to the end
//! user — response text must not let a caller distinguish "unknown user"
//! from "wrong device".

use finauth_common_registry::{RegistryError, UserStoreError};
use thiserror::Error;

/// Device authentication errors.
///
/// All failures are terminal: the pipeline never retries internally. Whether
/// the end user may retry with a fresh token is the calling framework's
/// decision.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]` — new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// A required request parameter or token claim is absent or blank.
    #[error("Required field missing: {message}")]
    RequiredFieldMissing {
        /// Which field was missing.
        message: String,
    },

    /// Malformed token — cannot be parsed as a structurally valid JWT.
    #[error("Invalid token format: {message}")]
    InvalidTokenFormat {
        /// What failed to parse.
        message: String,
    },

    /// The user store could not resolve the claimed subject.
    #[error("User resolution failed")]
    UserResolutionFailed {
        /// The underlying user store error.
        #[source]
        source: UserStoreError,
    },

    /// The claimed device is not registered to the resolved user.
    ///
    /// The display message is deliberately generic; the claimed device id is
    /// logged by the resolver, never echoed here.
    #[error("Device verification failed")]
    DeviceNotFound,

    /// The device registry rejected the request (client-caused).
    #[error("Device registry rejected the request")]
    DeviceRegistryRejected {
        /// The underlying registry error.
        #[source]
        source: RegistryError,
    },

    /// The device registry backend failed (server-caused).
    ///
    /// Retryable at a higher layer, never inside this pipeline.
    #[error("Device registry unavailable")]
    DeviceRegistryUnavailable {
        /// The underlying registry error.
        #[source]
        source: RegistryError,
    },

    /// The token identifier has already been presented.
    #[error("Token replay detected: jti '{jti}' already used")]
    ReplayDetected {
        /// The replayed JWT ID.
        jti: String,
    },

    /// Algorithm not in the accepted list.
    #[error("Unsupported algorithm: {message}")]
    UnsupportedAlgorithm {
        /// Which algorithm was rejected and why.
        message: String,
    },

    /// The enrolled public key could not be decoded.
    #[error("Invalid public key: {message}")]
    InvalidPublicKey {
        /// What was wrong with the key material.
        message: String,
    },

    /// Signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// Token not yet valid (nbf claim in the future).
    #[error("Token not yet valid")]
    TokenNotYetValid,

    /// The request object's digest does not match the digest bound into the
    /// token.
    #[error("Request object digest mismatch: {message}")]
    RequestObjectMismatch {
        /// Why the binding check failed.
        message: String,
    },

    /// A bundle reached signature verification without a resolved public
    /// key. This is a programming or configuration error in the caller, not
    /// a property of the token.
    #[error("No public key resolved before validation")]
    MissingPublicKey,
}

impl AuthError {
    /// Creates a new `RequiredFieldMissing` error.
    #[must_use]
    pub fn required_field_missing(message: impl Into<String>) -> Self {
        Self::RequiredFieldMissing { message: message.into() }
    }

    /// Creates a new `InvalidTokenFormat` error.
    #[must_use]
    pub fn invalid_token_format(message: impl Into<String>) -> Self {
        Self::InvalidTokenFormat { message: message.into() }
    }

    /// Creates a new `UserResolutionFailed` error wrapping the store error.
    #[must_use]
    pub fn user_resolution_failed(source: UserStoreError) -> Self {
        Self::UserResolutionFailed { source }
    }

    /// Creates a new `DeviceNotFound` error.
    #[must_use]
    pub fn device_not_found() -> Self {
        Self::DeviceNotFound
    }

    /// Creates a new `ReplayDetected` error for the given JWT ID.
    #[must_use]
    pub fn replay_detected(jti: impl Into<String>) -> Self {
        Self::ReplayDetected { jti: jti.into() }
    }

    /// Creates a new `UnsupportedAlgorithm` error.
    #[must_use]
    pub fn unsupported_algorithm(message: impl Into<String>) -> Self {
        Self::UnsupportedAlgorithm { message: message.into() }
    }

    /// Creates a new `InvalidPublicKey` error.
    #[must_use]
    pub fn invalid_public_key(message: impl Into<String>) -> Self {
        Self::InvalidPublicKey { message: message.into() }
    }

    /// Creates a new `InvalidSignature` error.
    #[must_use]
    pub fn invalid_signature() -> Self {
        Self::InvalidSignature
    }

    /// Creates a new `TokenExpired` error.
    #[must_use]
    pub fn token_expired() -> Self {
        Self::TokenExpired
    }

    /// Creates a new `TokenNotYetValid` error.
    #[must_use]
    pub fn token_not_yet_valid() -> Self {
        Self::TokenNotYetValid
    }

    /// Creates a new `RequestObjectMismatch` error.
    #[must_use]
    pub fn request_object_mismatch(message: impl Into<String>) -> Self {
        Self::RequestObjectMismatch { message: message.into() }
    }

    /// Creates a new `MissingPublicKey` error.
    #[must_use]
    pub fn missing_public_key() -> Self {
        Self::MissingPublicKey
    }

    /// Stable machine-readable rejection code for the calling framework.
    ///
    /// Fine-grained variants collapse into the coarser external taxonomy:
    /// algorithm and key-material failures all surface as
    /// `INVALID_SIGNATURE`, so response codes reveal nothing about *how*
    /// cryptographic verification failed.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RequiredFieldMissing { .. } => "REQUIRED_FIELD_MISSING",
            Self::InvalidTokenFormat { .. } => "MALFORMED_TOKEN",
            Self::UserResolutionFailed { .. } => "USER_RESOLUTION_FAILED",
            Self::DeviceNotFound => "DEVICE_NOT_FOUND",
            Self::DeviceRegistryRejected { .. } => "DEVICE_REGISTRY_REJECTED",
            Self::DeviceRegistryUnavailable { .. } => "DEVICE_REGISTRY_UNAVAILABLE",
            Self::ReplayDetected { .. } => "REPLAY_DETECTED",
            Self::UnsupportedAlgorithm { .. }
            | Self::InvalidPublicKey { .. }
            | Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenNotYetValid => "TOKEN_NOT_YET_VALID",
            Self::RequestObjectMismatch { .. } => "REQUEST_OBJECT_MISMATCH",
            Self::MissingPublicKey => "INTERNAL_ERROR",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidToken => AuthError::invalid_token_format("Invalid JWT structure"),
            ErrorKind::InvalidSignature => AuthError::invalid_signature(),
            ErrorKind::ExpiredSignature => AuthError::token_expired(),
            ErrorKind::ImmatureSignature => AuthError::token_not_yet_valid(),
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                AuthError::unsupported_algorithm("Algorithm not supported")
            },
            _ => AuthError::invalid_token_format(format!("JWT error: {}", err)),
        }
    }
}

impl From<UserStoreError> for AuthError {
    fn from(err: UserStoreError) -> Self {
        AuthError::user_resolution_failed(err)
    }
}

impl From<RegistryError> for AuthError {
    fn from(err: RegistryError) -> Self {
        // Preserve the collaborator's client/server partition: client-caused
        // failures are terminal rejections, server-caused ones are retryable
        // at a higher layer.
        if err.is_client_caused() {
            AuthError::DeviceRegistryRejected { source: err }
        } else {
            AuthError::DeviceRegistryUnavailable { source: err }
        }
    }
}

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;
