//! Fuzz target for device verification token parsing.
//!
//! Feeds arbitrary byte strings as token input to the codec and downstream
//! validators. The goal is to find inputs that cause panics, hangs, or
//! unexpected behavior — every result must be either `Ok(...)` or
//! `Err(AuthError)`.

#![no_main]

use libfuzzer_sys::fuzz_target;

use finauth_common_authn::{
    token::DeviceVerificationToken,
    validation::{validate_algorithm, validate_request_digest},
};

fuzz_target!(|data: &[u8]| {
    // Only process valid UTF-8 — tokens are always UTF-8 strings
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    // Fuzz the codec: must not panic on any input
    let decode_result = DeviceVerificationToken::decode(raw);

    if let Ok(ref token) = decode_result {
        // The header algorithm string must round-trip through the policy
        // check without panicking
        let alg_str = format!("{:?}", token.algorithm());
        let _ = validate_algorithm(&alg_str);

        // The digest claim must be parseable (or cleanly rejected) against
        // an arbitrary observed request object
        let _ = validate_request_digest(&token.claims().digest, raw);
    }
});
