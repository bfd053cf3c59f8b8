//! Device verification authenticator.
//!
//! The entry point the authentication framework routes requests to. A
//! device completes login in a single round trip: the request carries the
//! signed verification token and the raw request object, and this
//! authenticator decodes, resolves, and validates in one pass. There is no
//! initiate/challenge phase — a request without the token parameter cannot
//! be started, only rejected.

use std::collections::HashMap;

use finauth_common_registry::{DeviceId, LocalIdentity};

use crate::{
    chain::ValidationChain, error::AuthError, resolver::DeviceKeyResolver,
    token::DeviceVerificationToken,
};

/// Authenticator name registered with the framework.
pub const AUTHENTICATOR_NAME: &str = "device-verification-authenticator";

/// Human-readable authenticator name.
pub const AUTHENTICATOR_FRIENDLY_NAME: &str = "Device Verification Authenticator";

/// Request parameter carrying the compact signed verification token.
pub const DEVICE_VERIFICATION_TOKEN_PARAM: &str = "device_verification_token";

/// Request parameter carrying the raw request object the token's digest
/// claim is bound to.
pub const REQUEST_PARAM: &str = "request";

/// Request parameter carrying the framework's session correlation key.
///
/// Opaque to this authenticator; the framework uses it to resume a
/// multi-step flow.
pub const SESSION_DATA_KEY_PARAM: &str = "session_data_key";

/// An inbound authentication request, reduced to its parameter map.
///
/// The surrounding HTTP machinery is owned by the framework; this
/// authenticator only reads named parameters.
#[derive(Clone, Debug, Default)]
pub struct AuthnRequest {
    params: HashMap<String, String>,
}

impl AuthnRequest {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a request from an existing parameter map.
    #[must_use]
    pub fn from_params(params: HashMap<String, String>) -> Self {
        Self { params }
    }

    /// Adds a parameter, replacing any existing value.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Returns the named parameter, if present.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Observable state of one authentication attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthnState {
    /// No attempt has been made on this context.
    #[default]
    Idle,
    /// An attempt is in flight.
    Evaluating,
    /// The attempt succeeded; the context subject is the authenticated
    /// principal.
    Authenticated,
    /// The attempt was rejected.
    Rejected,
}

/// Per-attempt context shared with the framework.
///
/// The attempted subject is recorded here *before* the final verdict so
/// that audit and telemetry collaborators can attribute failed attempts;
/// authentication is only granted once the state reaches
/// [`AuthnState::Authenticated`].
#[derive(Clone, Debug, Default)]
pub struct AuthnContext {
    state: AuthnState,
    current_authenticator: Option<&'static str>,
    subject: Option<LocalIdentity>,
}

impl AuthnContext {
    /// Creates an idle context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of the attempt.
    #[must_use]
    pub fn state(&self) -> AuthnState {
        self.state
    }

    /// The authenticator handling this attempt, once one has claimed it.
    #[must_use]
    pub fn current_authenticator(&self) -> Option<&'static str> {
        self.current_authenticator
    }

    /// The attempted (and, on success, authenticated) subject.
    #[must_use]
    pub fn subject(&self) -> Option<&LocalIdentity> {
        self.subject.as_ref()
    }
}

/// Authenticates users from a device-bound verification token in a single
/// round trip.
///
/// Owns the process-wide [`DeviceKeyResolver`] and [`ValidationChain`];
/// both are created once at startup and injected, rather than living in
/// lazily-initialized statics.
pub struct DeviceAuthenticator {
    resolver: DeviceKeyResolver,
    chain: ValidationChain,
}

impl DeviceAuthenticator {
    /// Creates an authenticator over the given resolver and chain.
    #[must_use]
    pub fn new(resolver: DeviceKeyResolver, chain: ValidationChain) -> Self {
        Self { resolver, chain }
    }

    /// Authenticator name registered with the framework.
    #[must_use]
    pub fn name(&self) -> &'static str {
        AUTHENTICATOR_NAME
    }

    /// Human-readable authenticator name.
    #[must_use]
    pub fn friendly_name(&self) -> &'static str {
        AUTHENTICATOR_FRIENDLY_NAME
    }

    /// Whether this authenticator can handle the request.
    ///
    /// Device verification authenticates in one step off the token
    /// parameter, so its presence is both necessary and sufficient for
    /// routing.
    #[must_use]
    pub fn can_handle(&self, request: &AuthnRequest) -> bool {
        request
            .param(DEVICE_VERIFICATION_TOKEN_PARAM)
            .is_some_and(|token| !token.trim().is_empty())
    }

    /// The framework's session correlation key for this request, if any.
    ///
    /// Returned as-is; this authenticator does not interpret it.
    #[must_use]
    pub fn context_identifier<'a>(&self, request: &'a AuthnRequest) -> Option<&'a str> {
        request.param(SESSION_DATA_KEY_PARAM)
    }

    /// Initiating a challenge is not supported.
    ///
    /// The token carries all needed claims in one round trip; reaching this
    /// operation means the flow was misconfigured, so the attempt is
    /// terminated immediately.
    ///
    /// # Errors
    ///
    /// Always returns [`AuthError::RequiredFieldMissing`] for the token
    /// parameter.
    pub fn initiate(&self, context: &mut AuthnContext) -> Result<(), AuthError> {
        tracing::error!("Device verification authenticator cannot initiate an authentication flow");
        context.state = AuthnState::Rejected;
        Err(AuthError::required_field_missing(DEVICE_VERIFICATION_TOKEN_PARAM))
    }

    /// Processes an authentication response.
    ///
    /// Single-shot: decode the token, resolve the device key for the
    /// claimed user/device pair, bind the request object, and run the
    /// validation chain. The candidate subject is set on the context before
    /// the chain runs; the returned identity is only authenticated when the
    /// call succeeds.
    ///
    /// # Errors
    ///
    /// Propagates every failure kind from the codec, resolver, and chain.
    /// All failures are terminal; whether the end user may retry with a
    /// fresh token is the framework's decision.
    #[tracing::instrument(skip(self, request, context))]
    pub async fn authenticate(
        &self,
        request: &AuthnRequest,
        context: &mut AuthnContext,
    ) -> Result<LocalIdentity, AuthError> {
        context.current_authenticator = Some(AUTHENTICATOR_NAME);
        context.state = AuthnState::Evaluating;

        let result = self.process(request, context).await;
        match &result {
            Ok(identity) => {
                context.state = AuthnState::Authenticated;
                tracing::debug!(subject = %identity, "User authenticated via device verification token");
            },
            Err(e) => {
                context.state = AuthnState::Rejected;
                // Internal detail stays in the log; the caller sees the
                // stable kind plus a generic message.
                tracing::warn!(kind = e.kind(), error = %e, "Device authentication rejected");
            },
        }
        result
    }

    async fn process(
        &self,
        request: &AuthnRequest,
        context: &mut AuthnContext,
    ) -> Result<LocalIdentity, AuthError> {
        let raw_token = request
            .param(DEVICE_VERIFICATION_TOKEN_PARAM)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AuthError::required_field_missing(DEVICE_VERIFICATION_TOKEN_PARAM))?;

        let mut token = DeviceVerificationToken::decode(raw_token)?;

        let identity = LocalIdentity::from_subject_identifier(&token.claims().login_hint);
        let device_id = DeviceId::from(token.claims().did.as_str());

        let verifying_key = self.resolver.resolve_verifying_key(&device_id, &identity).await?;
        token.set_public_key(verifying_key);
        if let Some(request_object) = request.param(REQUEST_PARAM) {
            token.set_request_object(request_object);
        }

        // The attempted subject must be observable on the context even when
        // validation fails, so audit records stay attributable.
        context.subject = Some(identity.clone());

        self.chain.validate(&token).await?;

        Ok(identity)
    }
}
