//! # FinAuth Common Authentication
//!
//! Device-bound JWT authentication for FinAuth services.
//!
//! This crate provides:
//! - **Token codec**: device verification token parsing with verbatim
//!   signing-input retention
//! - **Replay cache**: atomic JTI tracking with token-lifetime expiry
//! - **Device key resolution**: user → device list → enrolled Ed25519 key
//! - **Validation chain**: ordered, fail-fast security checks
//! - **Authenticator**: the single-round-trip entry point for the framework
//!
//! ## Features
//!
//! - Only asymmetric EdDSA (Ed25519) is supported
//! - Symmetric algorithms (HS256, etc.) and `none` are explicitly rejected
//! - Tokens are bound to their authentication request via a digest claim
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use finauth_common_authn::{
//!     AuthnContext, AuthnRequest, DeviceAuthenticator, DeviceKeyResolver,
//!     InMemoryReplayCache, ValidationChain,
//! };
//! use finauth_common_registry::{MemoryDeviceRegistry, MemoryUserStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = DeviceKeyResolver::new(
//!     Arc::new(MemoryUserStore::new()),
//!     Arc::new(MemoryDeviceRegistry::new()),
//! );
//! let chain = ValidationChain::new(Arc::new(InMemoryReplayCache::new(10_000)));
//! let authenticator = DeviceAuthenticator::new(resolver, chain);
//!
//! let request = AuthnRequest::new()
//!     .with_param("device_verification_token", "eyJ0eXAiOiJKV1QiLCJhbGciOiJFZERTQSJ9...")
//!     .with_param("request", "{\"redirect_uri\":\"https://app.example/cb\"}");
//!
//! if authenticator.can_handle(&request) {
//!     let mut context = AuthnContext::new();
//!     let identity = authenticator.authenticate(&request, &mut context).await?;
//!     println!("Authenticated: {identity}");
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Authenticator orchestrator and request/context types.
pub mod authenticator;
/// Ordered validation chain.
pub mod chain;
/// Authentication error types.
pub mod error;
/// JTI replay prevention.
pub mod replay;
/// Device key resolution.
pub mod resolver;
/// Device verification token codec.
pub mod token;
/// Algorithm policy and digest validation.
pub mod validation;

/// Shared test helpers (feature-gated).
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used, clippy::panic)]
pub mod testutil;

// Re-export key types for convenience
pub use authenticator::{
    AUTHENTICATOR_FRIENDLY_NAME, AUTHENTICATOR_NAME, AuthnContext, AuthnRequest, AuthnState,
    DEVICE_VERIFICATION_TOKEN_PARAM, DeviceAuthenticator, REQUEST_PARAM, SESSION_DATA_KEY_PARAM,
};
pub use chain::{DEFAULT_MAX_TOKEN_LIFETIME, ValidationChain};
pub use error::{AuthError, Result};
pub use replay::{InMemoryReplayCache, ReplayCache};
pub use resolver::DeviceKeyResolver;
pub use token::{DeviceVerificationToken, VerificationClaims};
pub use validation::{ACCEPTED_ALGORITHMS, FORBIDDEN_ALGORITHMS, validate_algorithm};
