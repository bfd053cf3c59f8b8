//! Algorithm policy and request-object digest validation.
//!
//! # Security
//!
//! These validators implement security best practices:
//! - Strict algorithm checks to prevent algorithm substitution attacks
//! - Only asymmetric EdDSA (Ed25519) is allowed; symmetric algorithms and
//!   "none" are always rejected
//! - The digest bound into a token is recomputed over the out-of-band
//!   request object with the algorithm the claim itself names

use base64::{
    Engine,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use ed25519_dalek::{PUBLIC_KEY_LENGTH, VerifyingKey};
use sha2::{Digest, Sha256, Sha512};

use crate::error::AuthError;

/// Forbidden JWT algorithms that are never accepted for security reasons.
///
/// These algorithms are blocked because:
/// - `none`: No signature verification (trivially bypassable)
/// - `HS256`, `HS384`, `HS512`: Symmetric algorithms — a verifier holding
///   only the device's public key must never accept a MAC keyed with that
///   public key (the classic algorithm-confusion attack)
pub const FORBIDDEN_ALGORITHMS: &[&str] = &["none", "HS256", "HS384", "HS512"];

/// Accepted JWT algorithms.
///
/// Only EdDSA (Ed25519) is supported end-to-end: enrolled device keys are
/// 32-byte Ed25519 public keys, and the signature step verifies with
/// [`VerifyingKey::verify_strict`]. Per RFC 8725 Section 3.1, validators
/// must reject algorithms they do not fully implement — listing RS256 here
/// without verification support would produce confusing errors at the
/// signature verification stage.
pub const ACCEPTED_ALGORITHMS: &[&str] = &["EdDSA"];

/// Validate a token's algorithm against the security policy.
///
/// This function enforces strict algorithm security per RFC 8725:
/// - ALWAYS rejects symmetric algorithms (HS256, HS384, HS512)
/// - ALWAYS rejects "none"
/// - Only accepts EdDSA (Ed25519)
///
/// # Errors
///
/// Returns [`AuthError::UnsupportedAlgorithm`] if the algorithm is
/// forbidden or not in [`ACCEPTED_ALGORITHMS`].
///
/// # Examples
///
/// ```
/// use finauth_common_authn::validation::validate_algorithm;
///
/// assert!(validate_algorithm("EdDSA").is_ok());
/// assert!(validate_algorithm("RS256").is_err());
/// assert!(validate_algorithm("HS256").is_err());
/// ```
pub fn validate_algorithm(alg: &str) -> Result<(), AuthError> {
    // Check against forbidden algorithms
    if FORBIDDEN_ALGORITHMS.contains(&alg) {
        return Err(AuthError::unsupported_algorithm(format!(
            "Algorithm '{}' is not allowed for security reasons",
            alg
        )));
    }

    // Check if in accepted list
    if !ACCEPTED_ALGORITHMS.contains(&alg) {
        return Err(AuthError::unsupported_algorithm(format!(
            "Algorithm '{}' is not in accepted list (only EdDSA is supported)",
            alg
        )));
    }

    Ok(())
}

/// Decode an enrolled Ed25519 public key from its stored form.
///
/// Enrolled keys are raw 32-byte Ed25519 public keys encoded as base64url
/// without padding (43 characters).
///
/// # Errors
///
/// Returns [`AuthError::InvalidPublicKey`] if the value is not valid
/// base64url, is not exactly 32 bytes, or is not a valid curve point.
pub fn decode_verifying_key(public_key_b64: &str) -> Result<VerifyingKey, AuthError> {
    let key_bytes = URL_SAFE_NO_PAD
        .decode(public_key_b64)
        .map_err(|e| AuthError::invalid_public_key(format!("not valid base64url: {}", e)))?;

    let key_array: [u8; PUBLIC_KEY_LENGTH] = key_bytes.as_slice().try_into().map_err(|_| {
        AuthError::invalid_public_key(format!(
            "expected {} bytes, got {}",
            PUBLIC_KEY_LENGTH,
            key_bytes.len()
        ))
    })?;

    VerifyingKey::from_bytes(&key_array)
        .map_err(|e| AuthError::invalid_public_key(format!("not a valid Ed25519 key: {}", e)))
}

/// Validate the request-object binding of a token.
///
/// The digest claim has the form `"<ALGORITHM>=<base64>"`, e.g.
/// `"SHA-256=m5T…"`. The named algorithm is applied to the observed request
/// object and the result compared against the claimed value. Binding the
/// token to the request this way prevents a captured token from being
/// replayed against a different authentication request.
///
/// SHA-256 and SHA-512 are supported; the digest value uses standard base64.
///
/// # Errors
///
/// Returns [`AuthError::RequestObjectMismatch`] if the claim is malformed,
/// names an unsupported algorithm, or the computed digest differs.
pub fn validate_request_digest(digest_claim: &str, request_object: &str) -> Result<(), AuthError> {
    let Some((algorithm, claimed_value)) = digest_claim.split_once('=') else {
        return Err(AuthError::request_object_mismatch(
            "digest claim is not in '<algorithm>=<value>' form",
        ));
    };

    let computed = match algorithm {
        "SHA-256" => STANDARD.encode(Sha256::digest(request_object.as_bytes())),
        "SHA-512" => STANDARD.encode(Sha512::digest(request_object.as_bytes())),
        other => {
            return Err(AuthError::request_object_mismatch(format!(
                "unsupported digest algorithm '{}'",
                other
            )));
        },
    };

    if computed != claimed_value {
        return Err(AuthError::request_object_mismatch(
            "digest of request object does not match token claim",
        ));
    }

    Ok(())
}
