//! The ordered validation chain.
//!
//! Runs a fixed, fail-fast sequence of checks over a decoded
//! [`DeviceVerificationToken`]:
//!
//! 1. **Required fields** — subject hint and device id non-blank. The codec
//!    already guarantees this for tokens it produced, but a bundle may be
//!    constructed by other callers (tests, fixtures), so the chain
//!    re-verifies.
//! 2. **Replay** — atomically record the JTI; an already-seen identifier is
//!    rejected. Ordered before signature verification: the check is cheap,
//!    avoids spending asymmetric-crypto work on known-replayed identifiers,
//!    and recording first keeps the window for a parallel replay as small
//!    as possible.
//! 3. **Signature** — algorithm policy, then Ed25519 verification over the
//!    verbatim signing input with the resolved device key.
//! 4. **Timeliness** — claims-window consistency, strict expiry, not-before,
//!    future-iat, and the maximum-lifetime bound the replay cache's expiry
//!    contract relies on.
//! 5. **Request-object binding** — the digest of the out-of-band request
//!    object must match the digest claim signed into the token.
//!
//! The chain stops at the first failure and aggregates nothing across
//! tokens. Steps must not be reordered: later steps assume invariants
//! established by earlier ones (a digest mismatch is only meaningful once
//! authenticity holds, and replay recording must precede signature work).

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use ed25519_dalek::Signature;

use crate::{
    error::AuthError,
    replay::ReplayCache,
    token::DeviceVerificationToken,
    validation::{validate_algorithm, validate_request_digest},
};

/// Default upper bound on `exp − iat` (24 hours).
///
/// The replay cache keeps each JTI for the token's remaining lifetime; this
/// bound guarantees no token can be minted with a lifetime that outlives its
/// replay-cache entry.
pub const DEFAULT_MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(86_400);

/// Ordered, fail-fast validation over device verification tokens.
///
/// Holds the process-wide [`ReplayCache`] — the only shared mutable state in
/// the pipeline. Everything else is a pure function of the bundle and the
/// clock.
pub struct ValidationChain {
    replay: Arc<dyn ReplayCache>,
    max_token_lifetime: Duration,
}

impl ValidationChain {
    /// Creates a chain with the default maximum token lifetime.
    #[must_use]
    pub fn new(replay: Arc<dyn ReplayCache>) -> Self {
        Self { replay, max_token_lifetime: DEFAULT_MAX_TOKEN_LIFETIME }
    }

    /// Creates a chain with a custom maximum token lifetime.
    ///
    /// The replay cache's entry TTL tracks each token's remaining lifetime,
    /// so the configured bound must not exceed the lifetime the deployment's
    /// cache sizing assumes.
    #[must_use]
    pub fn with_max_token_lifetime(replay: Arc<dyn ReplayCache>, max: Duration) -> Self {
        Self { replay, max_token_lifetime: max }
    }

    /// Validates a bundle, returning the first failure.
    ///
    /// # Errors
    ///
    /// See the module documentation for the per-step error kinds.
    #[tracing::instrument(skip(self, token), fields(jti = %token.claims().jti))]
    pub async fn validate(&self, token: &DeviceVerificationToken) -> Result<(), AuthError> {
        check_required_fields(token)?;
        self.check_replay(token).await?;
        check_signature(token)?;
        self.check_timeliness(token)?;
        check_request_binding(token)?;
        Ok(())
    }

    /// Step 2: record the JTI before any cryptographic work.
    async fn check_replay(&self, token: &DeviceVerificationToken) -> Result<(), AuthError> {
        let now = Utc::now().timestamp() as u64;
        let expires_in = Duration::from_secs(token.claims().exp.saturating_sub(now));
        self.replay.check_and_record(&token.claims().jti, expires_in).await
    }

    /// Step 4: timestamp checks.
    fn check_timeliness(&self, token: &DeviceVerificationToken) -> Result<(), AuthError> {
        let claims = token.claims();
        let now = Utc::now().timestamp() as u64;

        // The codec does not validate the claims window; a token whose
        // window is self-contradictory is malformed.
        if claims.nbf > claims.exp {
            return Err(AuthError::invalid_token_format("nbf is later than exp"));
        }

        // Strict comparison: a token expiring exactly now is expired.
        if claims.exp <= now {
            return Err(AuthError::token_expired());
        }

        // A token becoming valid exactly now is valid.
        if claims.nbf > now {
            return Err(AuthError::token_not_yet_valid());
        }

        if claims.iat > now {
            return Err(AuthError::invalid_token_format("iat claim is in the future"));
        }

        if claims.exp - claims.iat > self.max_token_lifetime.as_secs() {
            return Err(AuthError::invalid_token_format(format!(
                "token lifetime exceeds maximum of {} seconds",
                self.max_token_lifetime.as_secs()
            )));
        }

        Ok(())
    }
}

/// Step 1: subject hint and device id must be usable.
fn check_required_fields(token: &DeviceVerificationToken) -> Result<(), AuthError> {
    if token.claims().login_hint.trim().is_empty() {
        return Err(AuthError::required_field_missing("login_hint"));
    }
    if token.claims().did.trim().is_empty() {
        return Err(AuthError::required_field_missing("did"));
    }
    Ok(())
}

/// Step 3: algorithm policy, then Ed25519 verification over the verbatim
/// signing input.
fn check_signature(token: &DeviceVerificationToken) -> Result<(), AuthError> {
    // Reject algorithm-confusion attempts before touching the key: the
    // header must name the algorithm the enrolled key type supports.
    let alg = format!("{:?}", token.algorithm());
    validate_algorithm(&alg)?;

    let key = token.public_key().ok_or_else(AuthError::missing_public_key)?;

    let signature =
        Signature::from_slice(token.signature()).map_err(|_| AuthError::invalid_signature())?;

    key.verify_strict(token.signing_input(), &signature)
        .map_err(|_| AuthError::invalid_signature())
}

/// Step 5: bind the token to this authentication attempt's request object.
fn check_request_binding(token: &DeviceVerificationToken) -> Result<(), AuthError> {
    let request_object = token
        .request_object()
        .ok_or_else(|| AuthError::request_object_mismatch("no request object supplied"))?;
    validate_request_digest(&token.claims().digest, request_object)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::{
        replay::InMemoryReplayCache,
        testutil::{generate_test_keypair, signed_token},
        token::VerificationClaims,
        validation::decode_verifying_key,
    };

    fn chain() -> ValidationChain {
        ValidationChain::new(Arc::new(InMemoryReplayCache::new(1000)))
    }

    /// Decode a freshly signed token and populate the bundle with the
    /// matching public key and request object.
    fn valid_bundle(jti: &str) -> DeviceVerificationToken {
        let (pkcs8_der, public_key_b64) = generate_test_keypair();
        let raw = signed_token(&pkcs8_der).jti(jti).request_object("request-object").build();

        let mut token = DeviceVerificationToken::decode(&raw).unwrap();
        token.set_public_key(decode_verifying_key(&public_key_b64).unwrap());
        token.set_request_object("request-object");
        token
    }

    fn now() -> u64 {
        Utc::now().timestamp() as u64
    }

    fn claims_valid_now(jti: &str) -> VerificationClaims {
        VerificationClaims {
            login_hint: "alice@carbon.super".into(),
            did: "dev-42".into(),
            jti: jti.into(),
            iat: now(),
            nbf: now().saturating_sub(1),
            exp: now() + 60,
            digest: "SHA-256=unchecked".into(),
        }
    }

    /// Build a bundle from explicit parts with a signature that cannot
    /// verify (the chain is expected to fail before or at the signature
    /// step, depending on the test).
    fn unsigned_bundle(claims: VerificationClaims) -> DeviceVerificationToken {
        DeviceVerificationToken::from_parts(
            claims,
            jsonwebtoken::Algorithm::EdDSA,
            b"header.payload".to_vec(),
            vec![0u8; 64],
        )
    }

    #[tokio::test]
    async fn test_valid_token_passes() {
        let token = valid_bundle("chain-ok");
        assert!(chain().validate(&token).await.is_ok());
    }

    #[tokio::test]
    async fn test_blank_login_hint_fails_first() {
        let mut claims = claims_valid_now("chain-blank");
        claims.login_hint = "".into();
        let token = unsigned_bundle(claims);

        let result = chain().validate(&token).await;
        assert!(matches!(result, Err(AuthError::RequiredFieldMissing { .. })));
    }

    #[tokio::test]
    async fn test_replay_rejected_on_second_validation() {
        let token = valid_bundle("chain-replay");
        let chain = chain();

        chain.validate(&token).await.unwrap();
        let result = chain.validate(&token).await;
        assert!(matches!(result, Err(AuthError::ReplayDetected { .. })));
    }

    #[tokio::test]
    async fn test_replay_recorded_even_when_signature_fails() {
        // The replay step runs before signature verification, so a failed
        // attempt still consumes the JTI: an attacker cannot probe with a
        // broken signature and then replay the identifier.
        let (pkcs8_der, _) = generate_test_keypair();
        let (_, other_public_key) = generate_test_keypair();
        let raw = signed_token(&pkcs8_der).jti("chain-burn").build();

        let mut token = DeviceVerificationToken::decode(&raw).unwrap();
        token.set_public_key(decode_verifying_key(&other_public_key).unwrap());
        token.set_request_object("request-object");

        let chain = chain();
        let first = chain.validate(&token).await;
        assert!(matches!(first, Err(AuthError::InvalidSignature)));

        let second = chain.validate(&token).await;
        assert!(matches!(second, Err(AuthError::ReplayDetected { .. })));
    }

    #[tokio::test]
    async fn test_wrong_key_fails_signature() {
        let (pkcs8_der, _) = generate_test_keypair();
        let (_, other_public_key) = generate_test_keypair();
        let raw = signed_token(&pkcs8_der).jti("chain-wrong-key").build();

        let mut token = DeviceVerificationToken::decode(&raw).unwrap();
        token.set_public_key(decode_verifying_key(&other_public_key).unwrap());
        token.set_request_object("request-object");

        let result = chain().validate(&token).await;
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[tokio::test]
    async fn test_missing_public_key_is_internal_error() {
        let (pkcs8_der, _) = generate_test_keypair();
        let raw = signed_token(&pkcs8_der).jti("chain-no-key").build();

        let mut token = DeviceVerificationToken::decode(&raw).unwrap();
        token.set_request_object("request-object");

        let result = chain().validate(&token).await;
        assert!(matches!(result, Err(AuthError::MissingPublicKey)));
    }

    #[tokio::test]
    async fn test_order_bad_signature_and_bad_digest_reports_signature() {
        // A token with both an invalid signature and an invalid digest must
        // fail at the signature step — the digest comparison never runs.
        let (pkcs8_der, _) = generate_test_keypair();
        let (_, other_public_key) = generate_test_keypair();
        let raw = signed_token(&pkcs8_der).jti("chain-order").request_object("original").build();

        let mut token = DeviceVerificationToken::decode(&raw).unwrap();
        token.set_public_key(decode_verifying_key(&other_public_key).unwrap());
        token.set_request_object("tampered");

        let result = chain().validate(&token).await;
        assert!(
            matches!(result, Err(AuthError::InvalidSignature)),
            "signature must be reported before digest, got {result:?}"
        );
    }

    #[tokio::test]
    async fn test_expired_at_boundary_rejected() {
        // exp exactly equal to "now" must already count as expired.
        let (pkcs8_der, public_key_b64) = generate_test_keypair();
        let ts = now();
        let raw = signed_token(&pkcs8_der)
            .jti("chain-exp-boundary")
            .iat(ts.saturating_sub(30))
            .nbf(ts.saturating_sub(30))
            .exp(ts)
            .build();

        let mut token = DeviceVerificationToken::decode(&raw).unwrap();
        token.set_public_key(decode_verifying_key(&public_key_b64).unwrap());
        token.set_request_object("request-object");

        let result = chain().validate(&token).await;
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn test_not_before_at_boundary_accepted() {
        // A token becoming valid exactly "now" is already valid.
        let (pkcs8_der, public_key_b64) = generate_test_keypair();
        let ts = now();
        let raw = signed_token(&pkcs8_der)
            .jti("chain-nbf-boundary")
            .iat(ts)
            .nbf(ts)
            .exp(ts + 60)
            .build();

        let mut token = DeviceVerificationToken::decode(&raw).unwrap();
        token.set_public_key(decode_verifying_key(&public_key_b64).unwrap());
        token.set_request_object("request-object");

        assert!(chain().validate(&token).await.is_ok());
    }

    #[tokio::test]
    async fn test_not_before_in_future_rejected() {
        let (pkcs8_der, public_key_b64) = generate_test_keypair();
        let ts = now();
        let raw = signed_token(&pkcs8_der)
            .jti("chain-nbf-future")
            .iat(ts)
            .nbf(ts + 3600)
            .exp(ts + 7200)
            .build();

        let mut token = DeviceVerificationToken::decode(&raw).unwrap();
        token.set_public_key(decode_verifying_key(&public_key_b64).unwrap());
        token.set_request_object("request-object");

        let result = chain().validate(&token).await;
        assert!(matches!(result, Err(AuthError::TokenNotYetValid)));
    }

    #[tokio::test]
    async fn test_window_inconsistency_is_malformed() {
        let (pkcs8_der, public_key_b64) = generate_test_keypair();
        let ts = now();
        let raw = signed_token(&pkcs8_der)
            .jti("chain-window")
            .iat(ts)
            .nbf(ts + 7200)
            .exp(ts + 60)
            .build();

        let mut token = DeviceVerificationToken::decode(&raw).unwrap();
        token.set_public_key(decode_verifying_key(&public_key_b64).unwrap());
        token.set_request_object("request-object");

        let result = chain().validate(&token).await;
        assert!(
            matches!(result, Err(AuthError::InvalidTokenFormat { ref message }) if message.contains("nbf"))
        );
    }

    #[tokio::test]
    async fn test_excessive_lifetime_rejected() {
        let (pkcs8_der, public_key_b64) = generate_test_keypair();
        let ts = now();
        let raw = signed_token(&pkcs8_der)
            .jti("chain-lifetime")
            .iat(ts)
            .nbf(ts)
            .exp(ts + 600)
            .build();

        let mut token = DeviceVerificationToken::decode(&raw).unwrap();
        token.set_public_key(decode_verifying_key(&public_key_b64).unwrap());
        token.set_request_object("request-object");

        let chain = ValidationChain::with_max_token_lifetime(
            Arc::new(InMemoryReplayCache::new(1000)),
            Duration::from_secs(300),
        );
        let result = chain.validate(&token).await;
        assert!(
            matches!(result, Err(AuthError::InvalidTokenFormat { ref message }) if message.contains("lifetime"))
        );
    }

    #[tokio::test]
    async fn test_tampered_request_object_rejected() {
        let (pkcs8_der, public_key_b64) = generate_test_keypair();
        let raw = signed_token(&pkcs8_der).jti("chain-digest").request_object("original").build();

        let mut token = DeviceVerificationToken::decode(&raw).unwrap();
        token.set_public_key(decode_verifying_key(&public_key_b64).unwrap());
        token.set_request_object("tampered");

        let result = chain().validate(&token).await;
        assert!(matches!(result, Err(AuthError::RequestObjectMismatch { .. })));
    }

    #[tokio::test]
    async fn test_missing_request_object_rejected() {
        let (pkcs8_der, public_key_b64) = generate_test_keypair();
        let raw = signed_token(&pkcs8_der).jti("chain-no-req").build();

        let mut token = DeviceVerificationToken::decode(&raw).unwrap();
        token.set_public_key(decode_verifying_key(&public_key_b64).unwrap());

        let result = chain().validate(&token).await;
        assert!(
            matches!(result, Err(AuthError::RequestObjectMismatch { ref message }) if message.contains("no request object"))
        );
    }

    #[tokio::test]
    async fn test_hs256_header_rejected_by_algorithm_policy() {
        let mut claims = claims_valid_now("chain-hs256");
        claims.digest = "SHA-256=irrelevant".into();
        let token = DeviceVerificationToken::from_parts(
            claims,
            jsonwebtoken::Algorithm::HS256,
            b"header.payload".to_vec(),
            vec![0u8; 32],
        );

        let result = chain().validate(&token).await;
        assert!(matches!(result, Err(AuthError::UnsupportedAlgorithm { .. })));
    }
}
