//! Device verification token codec.
//!
//! Parses the compact signed token a device presents to complete login into
//! a [`DeviceVerificationToken`] — the bundle the validation chain operates
//! on. Decoding is a pure parse: no clock access, no key lookups, no
//! cryptography. The subject hint and device id are extracted (and checked
//! non-blank) here because they drive key resolution *before* any
//! signature work can happen.
//!
//! The signing input and signature bytes are retained verbatim from the
//! wire form; signature verification is bit-exact over the original bytes,
//! so the codec never normalizes or re-encodes them.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use ed25519_dalek::VerifyingKey;
use jsonwebtoken::{Algorithm, decode_header};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Claim set of a device verification token.
///
/// A well-formed token carries:
///
/// ```json
/// {
///   "login_hint": "alice@carbon.super",
///   "did": "dev-42",
///   "jti": "jti-001",
///   "iat": 1735600000,
///   "nbf": 1735600000,
///   "exp": 1735600060,
///   "digest": "SHA-256=m5T0N1c2..."
/// }
/// ```
///
/// `login_hint` and `did` deserialize with a default so their absence is
/// reported as a required-field failure rather than a parse failure; all
/// other claims are structurally required.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationClaims {
    /// Subject hint identifying the user attempting to log in.
    #[serde(default)]
    pub login_hint: String,
    /// Identifier of the device that signed this token.
    #[serde(default)]
    pub did: String,
    /// JWT ID — unique per token, used for replay detection.
    pub jti: String,
    /// Issued at (seconds since epoch).
    pub iat: u64,
    /// Not before (seconds since epoch).
    pub nbf: u64,
    /// Expiration time (seconds since epoch).
    pub exp: u64,
    /// Digest of the request object, `"<algorithm>=<base64>"` form.
    pub digest: String,
}

/// A decoded device verification token plus the context needed to validate
/// it.
///
/// Produced by [`decode`](Self::decode); the orchestrator then populates the
/// resolved device public key and the raw request object (supplied
/// out-of-band by the request, not covered by the signature) before handing
/// the bundle to the validation chain. The chain treats the bundle as
/// immutable.
#[derive(Clone, Debug)]
pub struct DeviceVerificationToken {
    claims: VerificationClaims,
    algorithm: Algorithm,
    /// `header.payload` exactly as received — the bytes the signature
    /// covers.
    signing_input: Vec<u8>,
    /// Decoded signature bytes.
    signature: Vec<u8>,
    /// Device public key, resolved by the orchestrator after decoding.
    public_key: Option<VerifyingKey>,
    /// Raw request object supplied by the authentication request.
    request_object: Option<String>,
}

impl DeviceVerificationToken {
    /// Decodes a compact token string into a verification bundle.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidTokenFormat`] if the string is not a
    ///   three-segment JWT, a segment is not valid base64url, or the claims
    ///   are not valid JSON
    /// - [`AuthError::UnsupportedAlgorithm`] if the header names an
    ///   algorithm the `jsonwebtoken` header parser does not recognize
    /// - [`AuthError::RequiredFieldMissing`] if `login_hint` or `did` is
    ///   absent or blank
    pub fn decode(raw: &str) -> Result<Self, AuthError> {
        let parts: Vec<&str> = raw.split('.').collect();
        let [header_b64, payload_b64, signature_b64] = parts.as_slice() else {
            return Err(AuthError::invalid_token_format(
                "JWT must have 3 parts separated by dots",
            ));
        };

        let header = decode_header(raw)?;

        let payload_bytes = URL_SAFE_NO_PAD.decode(payload_b64).map_err(|e| {
            AuthError::invalid_token_format(format!("Failed to decode JWT payload: {}", e))
        })?;
        let claims: VerificationClaims = serde_json::from_slice(&payload_bytes).map_err(|e| {
            AuthError::invalid_token_format(format!("Failed to parse JWT claims: {}", e))
        })?;

        // The subject hint and device id drive key resolution and must be
        // usable before any cryptographic work.
        if claims.login_hint.trim().is_empty() {
            return Err(AuthError::required_field_missing("login_hint"));
        }
        if claims.did.trim().is_empty() {
            return Err(AuthError::required_field_missing("did"));
        }

        let signature = URL_SAFE_NO_PAD.decode(signature_b64).map_err(|e| {
            AuthError::invalid_token_format(format!("Failed to decode JWT signature: {}", e))
        })?;

        let signing_input = format!("{header_b64}.{payload_b64}").into_bytes();

        Ok(Self {
            claims,
            algorithm: header.alg,
            signing_input,
            signature,
            public_key: None,
            request_object: None,
        })
    }

    /// The decoded claim set.
    #[must_use]
    pub fn claims(&self) -> &VerificationClaims {
        &self.claims
    }

    /// The algorithm named in the token header.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The verbatim `header.payload` bytes the signature covers.
    #[must_use]
    pub fn signing_input(&self) -> &[u8] {
        &self.signing_input
    }

    /// The decoded signature bytes.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// The resolved device public key, if populated.
    #[must_use]
    pub fn public_key(&self) -> Option<&VerifyingKey> {
        self.public_key.as_ref()
    }

    /// The observed request object, if populated.
    #[must_use]
    pub fn request_object(&self) -> Option<&str> {
        self.request_object.as_deref()
    }

    /// Populates the device public key resolved for this token's claimed
    /// user/device pair.
    pub fn set_public_key(&mut self, key: VerifyingKey) {
        self.public_key = Some(key);
    }

    /// Populates the raw request object supplied alongside the token.
    ///
    /// The request object is not itself signed; the chain binds it to the
    /// token by recomputing its digest against the `digest` claim.
    pub fn set_request_object(&mut self, request_object: impl Into<String>) {
        self.request_object = Some(request_object.into());
    }

    /// Assembles a bundle from explicit parts, bypassing the codec.
    ///
    /// The validation chain re-verifies required fields precisely because
    /// bundles built this way carry no codec guarantees.
    #[cfg(any(test, feature = "testutil"))]
    #[must_use]
    pub fn from_parts(
        claims: VerificationClaims,
        algorithm: Algorithm,
        signing_input: Vec<u8>,
        signature: Vec<u8>,
    ) -> Self {
        Self { claims, algorithm, signing_input, signature, public_key: None, request_object: None }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
    use serde_json::json;

    use super::*;
    use crate::testutil::{craft_raw_token, generate_test_keypair, signed_token};

    #[test]
    fn test_decode_valid_token() {
        let (pkcs8_der, _) = generate_test_keypair();
        let raw = signed_token(&pkcs8_der)
            .login_hint("alice@carbon.super")
            .did("dev-42")
            .jti("jti-001")
            .request_object("req-obj")
            .build();

        let token = DeviceVerificationToken::decode(&raw).unwrap();
        assert_eq!(token.claims().login_hint, "alice@carbon.super");
        assert_eq!(token.claims().did, "dev-42");
        assert_eq!(token.claims().jti, "jti-001");
        assert_eq!(token.algorithm(), Algorithm::EdDSA);
        assert!(token.public_key().is_none());
        assert!(token.request_object().is_none());
    }

    #[test]
    fn test_decode_retains_wire_bytes_verbatim() {
        let (pkcs8_der, _) = generate_test_keypair();
        let raw = signed_token(&pkcs8_der).build();

        let token = DeviceVerificationToken::decode(&raw).unwrap();

        let (signing_input, signature_b64) = raw.rsplit_once('.').unwrap();
        assert_eq!(token.signing_input(), signing_input.as_bytes());
        assert_eq!(token.signature(), URL_SAFE_NO_PAD.decode(signature_b64).unwrap());
    }

    #[test]
    fn test_decode_wrong_segment_count() {
        for raw in ["only.two", "a.b.c.d", "", "nodots"] {
            let result = DeviceVerificationToken::decode(raw);
            assert!(
                matches!(result, Err(AuthError::InvalidTokenFormat { .. })),
                "expected InvalidTokenFormat for {raw:?}, got {result:?}"
            );
        }
    }

    #[test]
    fn test_decode_blank_login_hint_is_required_field() {
        let header = json!({"alg": "EdDSA", "typ": "JWT"});
        let payload = json!({
            "login_hint": "  ",
            "did": "dev-42",
            "jti": "jti-001",
            "iat": 1, "nbf": 1, "exp": 9_999_999_999u64,
            "digest": "SHA-256=xxxx",
        });
        let raw = craft_raw_token(&header, &payload);

        let result = DeviceVerificationToken::decode(&raw);
        assert!(
            matches!(result, Err(AuthError::RequiredFieldMissing { ref message }) if message == "login_hint")
        );
    }

    #[test]
    fn test_decode_absent_did_is_required_field() {
        let header = json!({"alg": "EdDSA", "typ": "JWT"});
        let payload = json!({
            "login_hint": "alice@carbon.super",
            "jti": "jti-001",
            "iat": 1, "nbf": 1, "exp": 9_999_999_999u64,
            "digest": "SHA-256=xxxx",
        });
        let raw = craft_raw_token(&header, &payload);

        let result = DeviceVerificationToken::decode(&raw);
        assert!(
            matches!(result, Err(AuthError::RequiredFieldMissing { ref message }) if message == "did")
        );
    }

    #[test]
    fn test_decode_missing_jti_is_malformed() {
        // jti is structurally required; its absence is a parse failure, not
        // a required-field rejection.
        let header = json!({"alg": "EdDSA", "typ": "JWT"});
        let payload = json!({
            "login_hint": "alice@carbon.super",
            "did": "dev-42",
            "iat": 1, "nbf": 1, "exp": 9_999_999_999u64,
            "digest": "SHA-256=xxxx",
        });
        let raw = craft_raw_token(&header, &payload);

        let result = DeviceVerificationToken::decode(&raw);
        assert!(matches!(result, Err(AuthError::InvalidTokenFormat { .. })));
    }

    #[test]
    fn test_decode_payload_not_json() {
        let header_b64 = URL_SAFE_NO_PAD.encode(br#"{"alg":"EdDSA","typ":"JWT"}"#);
        let payload_b64 = URL_SAFE_NO_PAD.encode(b"this is not json");
        let raw = format!("{header_b64}.{payload_b64}.sig");

        let result = DeviceVerificationToken::decode(&raw);
        assert!(
            matches!(result, Err(AuthError::InvalidTokenFormat { ref message }) if message.contains("parse"))
        );
    }

    #[test]
    fn test_set_public_key_and_request_object() {
        let (pkcs8_der, public_key_b64) = generate_test_keypair();
        let raw = signed_token(&pkcs8_der).build();

        let mut token = DeviceVerificationToken::decode(&raw).unwrap();
        token.set_public_key(crate::validation::decode_verifying_key(&public_key_b64).unwrap());
        token.set_request_object("the request object");

        assert!(token.public_key().is_some());
        assert_eq!(token.request_object(), Some("the request object"));
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        /// Strategy for generating `VerificationClaims` with arbitrary field
        /// values.
        fn arb_claims() -> impl Strategy<Value = VerificationClaims> {
            (
                "[a-zA-Z0-9@._-]{1,64}",            // login_hint
                "[a-zA-Z0-9-]{1,64}",               // did
                "[a-zA-Z0-9-]{1,64}",               // jti
                1_000_000_000u64..2_000_000_000u64, // iat
                1_000_000_000u64..2_000_000_000u64, // nbf
                1_000_000_000u64..2_000_000_000u64, // exp
                "SHA-256=[a-zA-Z0-9+/]{1,64}",      // digest
            )
                .prop_map(|(login_hint, did, jti, iat, nbf, exp, digest)| VerificationClaims {
                    login_hint,
                    did,
                    jti,
                    iat,
                    nbf,
                    exp,
                    digest,
                })
        }

        proptest! {
            /// Serializing then deserializing any claim set must produce an
            /// identical struct.
            #[test]
            fn claims_serde_round_trip(claims in arb_claims()) {
                let json = serde_json::to_string(&claims).expect("serialize should succeed");
                let deserialized: VerificationClaims =
                    serde_json::from_str(&json).expect("deserialize should succeed");
                prop_assert_eq!(deserialized, claims);
            }

            /// Any claim set embedded in a structurally valid token must
            /// decode back to the same claims.
            #[test]
            fn decode_recovers_embedded_claims(claims in arb_claims()) {
                let header_b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD
                    .encode(br#"{"alg":"EdDSA","typ":"JWT"}"#);
                let payload_b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD
                    .encode(serde_json::to_vec(&claims).expect("serialize"));
                let raw = format!("{header_b64}.{payload_b64}.");

                let token = DeviceVerificationToken::decode(&raw).expect("decode");
                prop_assert_eq!(token.claims(), &claims);
            }
        }
    }

    /// Known-bad token inputs must never panic, only return errors.
    /// These cover attack vectors (alg:none, symmetric algorithms) and edge
    /// cases (empty input, invalid base64, oversized claims).
    mod fuzz_regressions {
        use super::*;

        fn exercise(raw: &str) -> bool {
            DeviceVerificationToken::decode(raw).is_ok()
        }

        #[test]
        fn empty_input_no_panic() {
            assert!(!exercise(""));
        }

        #[test]
        fn dots_only_no_panic() {
            assert!(!exercise("."));
            assert!(!exercise(".."));
            assert!(!exercise("..."));
        }

        #[test]
        fn alg_none_rejected_no_panic() {
            let header = json!({"alg": "none"});
            let payload = json!({
                "login_hint": "x", "did": "x", "jti": "x",
                "iat": 1, "nbf": 1, "exp": 1, "digest": "SHA-256=x",
            });
            assert!(!exercise(&craft_raw_token(&header, &payload)));
        }

        #[test]
        fn alg_hs256_parses_but_flagged_no_panic() {
            // HS256 parses as a known header algorithm; rejection happens at
            // the chain's algorithm policy, not in the codec.
            let header = json!({"alg": "HS256"});
            let payload = json!({
                "login_hint": "x", "did": "x", "jti": "x",
                "iat": 1, "nbf": 1, "exp": 1, "digest": "SHA-256=x",
            });
            let raw = craft_raw_token(&header, &payload);
            if let Ok(token) = DeviceVerificationToken::decode(&raw) {
                assert_eq!(token.algorithm(), Algorithm::HS256);
            }
        }

        #[test]
        fn invalid_base64_segments_no_panic() {
            assert!(!exercise("!!!.!!!.!!!"));
        }

        #[test]
        fn newlines_in_token_no_panic() {
            assert!(!exercise("eyJhbGciOiJFZERTQSJ9\n.eyJpc3MiOiJ0ZXN0In0\n."));
        }

        #[test]
        fn oversized_claims_no_panic() {
            let header = json!({"alg": "EdDSA"});
            let payload = json!({
                "login_hint": "A".repeat(100_000),
                "did": "x", "jti": "J".repeat(10_000),
                "iat": 1, "nbf": 1, "exp": 1, "digest": "SHA-256=x",
            });
            // Oversized string claims parse; no panic either way.
            let _ = exercise(&craft_raw_token(&header, &payload));
        }

        #[test]
        fn extreme_timestamps_no_panic() {
            let header = json!({"alg": "EdDSA"});
            let payload = json!({
                "login_hint": "x", "did": "x", "jti": "x",
                "iat": u64::MAX, "nbf": u64::MAX, "exp": u64::MAX,
                "digest": "SHA-256=x",
            });
            let _ = exercise(&craft_raw_token(&header, &payload));
        }

        #[test]
        fn unicode_in_claims_no_panic() {
            let header = json!({"alg": "EdDSA"});
            let payload = json!({
                "login_hint": "\u{1F4A9}@\u{FEFF}", "did": "\u{202E}dev", "jti": "x",
                "iat": 1, "nbf": 1, "exp": 1, "digest": "SHA-256=x",
            });
            let _ = exercise(&craft_raw_token(&header, &payload));
        }
    }
}
