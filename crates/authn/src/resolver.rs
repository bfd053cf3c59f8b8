//! Device key resolution.
//!
//! Resolves the Ed25519 public key for a token's claimed user/device pair:
//!
//! ```text
//! login hint → user store → internal user id
//!            → device registry → devices registered to that user
//!            → match claimed device id → enrolled public key
//! ```
//!
//! The resolution deliberately goes user → device list → match, never
//! device → owner: a global device-by-id lookup would confirm a device's
//! existence independent of the claimed user, and the key must only ever be
//! released for a device that is bound to the user the token names.

use std::sync::Arc;

use ed25519_dalek::VerifyingKey;
use finauth_common_registry::{DeviceId, DeviceRegistry, LocalIdentity, UserStore};

use crate::{error::AuthError, validation::decode_verifying_key};

/// Resolves device public keys through the user-store and device-registry
/// collaborators.
///
/// Created once at startup and injected into the
/// [`DeviceAuthenticator`](crate::authenticator::DeviceAuthenticator); it
/// holds no per-request state.
pub struct DeviceKeyResolver {
    users: Arc<dyn UserStore>,
    registry: Arc<dyn DeviceRegistry>,
}

impl DeviceKeyResolver {
    /// Creates a resolver over the given collaborators.
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, registry: Arc<dyn DeviceRegistry>) -> Self {
        Self { users, registry }
    }

    /// Resolves the enrolled public key for `device_id`, provided that
    /// device is registered to `identity`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::UserResolutionFailed`] if the user store cannot
    ///   resolve the identity to an internal user id
    /// - [`AuthError::DeviceNotFound`] if no device registered to the
    ///   resolved user carries the claimed id — a security-relevant
    ///   rejection: the token names a device that is not bound to the
    ///   claimed user
    /// - [`AuthError::DeviceRegistryRejected`] /
    ///   [`AuthError::DeviceRegistryUnavailable`] on registry failures,
    ///   preserving the collaborator's client/server partition
    /// - [`AuthError::InvalidPublicKey`] if the enrolled key material cannot
    ///   be decoded
    #[tracing::instrument(skip(self, identity), fields(subject = %identity))]
    pub async fn resolve_verifying_key(
        &self,
        device_id: &DeviceId,
        identity: &LocalIdentity,
    ) -> Result<VerifyingKey, AuthError> {
        let user_id =
            self.users.lookup_user_id(&identity.username, &identity.tenant_domain).await.map_err(
                |e| {
                    tracing::warn!(error = %e, "Failed to resolve user for device authentication");
                    AuthError::from(e)
                },
            )?;

        // The key is associated with the device, but trust is established
        // for the (user, device) pair: the claimed device must appear in the
        // resolved user's own device list.
        let devices = self.registry.list_devices(&user_id).await?;
        if !devices.iter().any(|d| d.device_id == *device_id) {
            tracing::warn!(
                device_id = %device_id,
                user_id = %user_id,
                "Claimed device is not registered to the resolved user"
            );
            return Err(AuthError::device_not_found());
        }

        let public_key = self.registry.get_public_key(device_id).await?;
        decode_verifying_key(&public_key)
    }
}
