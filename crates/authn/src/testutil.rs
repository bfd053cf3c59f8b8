//! Shared test utilities for device authentication testing.
//!
//! This module provides common helpers for generating Ed25519 key pairs,
//! building signed device verification tokens, crafting raw token strings
//! (for attack testing), and asserting error variants. It is feature-gated
//! behind `testutil` to prevent leaking into production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! finauth-common-authn = { path = "../authn", features = ["testutil"] }
//! ```
//!
//! Then import helpers:
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use finauth_common_authn::testutil::{generate_test_keypair, signed_token};
//! ```

use base64::{
    Engine,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use chrono::Utc;
use ed25519_dalek::SigningKey;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use rand_core::OsRng;
use serde_json::json;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Generates a test Ed25519 key pair.
///
/// Returns `(pkcs8_der, public_key_base64url)` where:
/// - `pkcs8_der` is the private key in PKCS#8 DER format wrapped in [`Zeroizing`] (suitable for
///   [`EncodingKey::from_ed_der`])
/// - `public_key_base64url` is the 32-byte public key encoded as base64url without padding
///   (suitable for a device registration's `public_key` field)
///
/// The private key material is wrapped in [`Zeroizing`] to ensure it is
/// scrubbed from memory on drop, even in test code.
///
/// Each call generates a fresh random key pair.
pub fn generate_test_keypair() -> (Zeroizing<Vec<u8>>, String) {
    let signing_key = SigningKey::generate(&mut OsRng);
    let public_key_bytes = signing_key.verifying_key().to_bytes();
    let public_key_b64 = URL_SAFE_NO_PAD.encode(public_key_bytes);

    // Wrap intermediate private bytes in Zeroizing to scrub from memory on drop.
    let private_bytes: Zeroizing<[u8; 32]> = Zeroizing::new(signing_key.to_bytes());
    let mut pkcs8_der = Zeroizing::new(vec![
        0x30, 0x2e, // SEQUENCE, 46 bytes
        0x02, 0x01, 0x00, // INTEGER version 0
        0x30, 0x05, // SEQUENCE, 5 bytes (algorithm identifier)
        0x06, 0x03, 0x2b, 0x65, 0x70, // OID 1.3.101.112 (Ed25519)
        0x04, 0x22, // OCTET STRING, 34 bytes
        0x04, 0x20, // OCTET STRING, 32 bytes (the actual key)
    ]);
    pkcs8_der.extend_from_slice(&*private_bytes);

    (pkcs8_der, public_key_b64)
}

/// Starts a builder for a signed device verification token.
///
/// Defaults describe a token that is valid right now for
/// `alice@carbon.super` on device `dev-42` with JTI `jti-001`, bound to the
/// request object `"request-object"`, expiring in 60 seconds.
#[must_use]
pub fn signed_token(pkcs8_der: &[u8]) -> SignedTokenBuilder<'_> {
    let now = Utc::now().timestamp() as u64;
    SignedTokenBuilder {
        pkcs8_der,
        login_hint: "alice@carbon.super".to_owned(),
        did: "dev-42".to_owned(),
        jti: "jti-001".to_owned(),
        iat: now,
        nbf: now.saturating_sub(1),
        exp: now + 60,
        request_object: "request-object".to_owned(),
    }
}

/// Builder for signed device verification tokens.
///
/// The `digest` claim is computed as `SHA-256=<base64>` over the configured
/// request object at build time, so a token built with
/// `.request_object(x)` always matches an observed request object `x`.
pub struct SignedTokenBuilder<'a> {
    pkcs8_der: &'a [u8],
    login_hint: String,
    did: String,
    jti: String,
    iat: u64,
    nbf: u64,
    exp: u64,
    request_object: String,
}

impl SignedTokenBuilder<'_> {
    /// Sets the subject hint claim.
    #[must_use]
    pub fn login_hint(mut self, login_hint: &str) -> Self {
        self.login_hint = login_hint.to_owned();
        self
    }

    /// Sets the device id claim.
    #[must_use]
    pub fn did(mut self, did: &str) -> Self {
        self.did = did.to_owned();
        self
    }

    /// Sets the JWT ID claim.
    #[must_use]
    pub fn jti(mut self, jti: &str) -> Self {
        self.jti = jti.to_owned();
        self
    }

    /// Sets the issued-at claim.
    #[must_use]
    pub fn iat(mut self, iat: u64) -> Self {
        self.iat = iat;
        self
    }

    /// Sets the not-before claim.
    #[must_use]
    pub fn nbf(mut self, nbf: u64) -> Self {
        self.nbf = nbf;
        self
    }

    /// Sets the expiry claim.
    #[must_use]
    pub fn exp(mut self, exp: u64) -> Self {
        self.exp = exp;
        self
    }

    /// Sets the request object the token's digest claim is computed over.
    #[must_use]
    pub fn request_object(mut self, request_object: &str) -> Self {
        self.request_object = request_object.to_owned();
        self
    }

    /// Signs and encodes the token.
    ///
    /// # Panics
    ///
    /// Panics if JWT encoding fails (should not happen with valid inputs).
    #[must_use]
    pub fn build(self) -> String {
        let digest =
            format!("SHA-256={}", STANDARD.encode(Sha256::digest(self.request_object.as_bytes())));
        let claims = json!({
            "login_hint": self.login_hint,
            "did": self.did,
            "jti": self.jti,
            "iat": self.iat,
            "nbf": self.nbf,
            "exp": self.exp,
            "digest": digest,
        });

        let header = Header::new(Algorithm::EdDSA);
        let encoding_key = EncodingKey::from_ed_der(self.pkcs8_der);
        jsonwebtoken::encode(&header, &claims, &encoding_key)
            .expect("Failed to encode test device verification token")
    }
}

/// Creates a raw token string from arbitrary header and payload JSON.
///
/// The resulting token has the structure `{header_b64}.{payload_b64}.`
/// with an empty signature. This is useful for testing rejection of
/// malformed or attack tokens (e.g., `alg: "none"`, algorithm confusion).
///
/// # Panics
///
/// Panics if JSON serialization fails.
pub fn craft_raw_token(
    header_json: &serde_json::Value,
    payload_json: &serde_json::Value,
) -> String {
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header_json).expect("header json"));
    let payload_b64 =
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload_json).expect("payload json"));
    format!("{header_b64}.{payload_b64}.")
}

/// Asserts that a `Result<T, AuthError>` is an `Err` matching the given
/// [`AuthError`](crate::error::AuthError) variant.
///
/// Works with any `AuthError` variant. On failure, prints the expected
/// variant and the actual result for debugging.
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use finauth_common_authn::assert_auth_error;
/// use finauth_common_authn::error::AuthError;
///
/// let result: Result<(), AuthError> = Err(AuthError::token_expired());
/// assert_auth_error!(result, TokenExpired);
/// ```
#[macro_export]
macro_rules! assert_auth_error {
    ($result:expr, $variant:ident) => {
        assert!(
            matches!($result, Err($crate::error::AuthError::$variant { .. })),
            "expected AuthError::{}, got: {:?}",
            stringify!($variant),
            $result,
        );
    };
    ($result:expr, $variant:ident, $msg:expr) => {
        assert!(
            matches!($result, Err($crate::error::AuthError::$variant { .. })),
            "{}: expected AuthError::{}, got: {:?}",
            $msg,
            stringify!($variant),
            $result,
        );
    };
}
