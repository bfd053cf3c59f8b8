//! Device registry trait and in-memory implementation.
//!
//! The [`DeviceRegistry`] trait abstracts read access to device registrations
//! so production (registry service) and testing (in-memory) can share the
//! same interface.
//!
//! # Identity Binding
//!
//! The registry is deliberately queried by *user*, not by device:
//! [`DeviceRegistry::list_devices`] returns the devices registered to one
//! user, and the caller matches the claimed device id against that list. A
//! global device-by-id lookup would answer "does this device exist" without
//! confirming ownership, which leaks device existence independent of the
//! claimed user.
//!
//! # Usage
//!
//! ```no_run
//! // Demonstrates the trait interface; requires a concrete implementation.
//! use finauth_common_registry::{DeviceRegistration, DeviceRegistry, RegistryResult, UserId};
//!
//! async fn devices_of<R: DeviceRegistry>(
//!     registry: &R,
//!     user_id: &UserId,
//! ) -> RegistryResult<Vec<DeviceRegistration>> {
//!     registry.list_devices(user_id).await
//! }
//! ```

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use parking_lot::RwLock;
use zeroize::Zeroizing;

use crate::{
    device::DeviceRegistration,
    error::{RegistryError, RegistryResult},
    types::{DeviceId, UserId},
};

/// Read access to device registrations and their enrolled public keys.
///
/// The authentication core holds a `dyn DeviceRegistry` and never writes
/// through it; enrollment is owned by the registration subsystem.
///
/// # Error Handling
///
/// Operations return [`RegistryResult`] with the client/server partition of
/// [`RegistryError`]. A lookup for something that does not exist is a
/// [`RegistryError::Client`]; backend failures are [`RegistryError::Server`].
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Lists all devices registered to the given user.
    ///
    /// Returns an empty vector when the user has no registered devices —
    /// an unknown user is not distinguishable from a user without devices
    /// at this interface.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Server`] if the registry backend is
    /// unavailable.
    async fn list_devices(&self, user_id: &UserId) -> RegistryResult<Vec<DeviceRegistration>>;

    /// Fetches the enrolled public key for the given device.
    ///
    /// The returned value is the base64url-encoded 32-byte Ed25519 public
    /// key, wrapped in [`Zeroizing`].
    ///
    /// Callers must have already confirmed the device belongs to the
    /// expected user via [`list_devices`](Self::list_devices) — this lookup
    /// alone does not establish ownership.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Client`] if no device with the given id is
    /// registered, [`RegistryError::Server`] on backend failure.
    async fn get_public_key(&self, device_id: &DeviceId) -> RegistryResult<Zeroizing<String>>;
}

/// In-memory implementation of [`DeviceRegistry`] for testing.
///
/// Stores registrations in a thread-safe hash map keyed by device id. Does
/// not persist data between restarts. Write access (enrollment, removal) is
/// exposed as inherent methods only, keeping the trait surface read-only.
///
/// # Thread Safety
///
/// Uses [`parking_lot::RwLock`] for efficient concurrent access with
/// reader-writer semantics.
///
/// # Examples
///
/// ```
/// use finauth_common_registry::{
///     DeviceRegistration, DeviceRegistry, MemoryDeviceRegistry, UserId,
/// };
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let registry = MemoryDeviceRegistry::new();
///     registry.enroll(
///         DeviceRegistration::builder()
///             .device_id("dev-1")
///             .user_id("user-1")
///             .public_key("hw5ZY3cM1b0QzjWjR9tBVcV0dE1nS4a2kP8uXyzGJqc".to_owned())
///             .build(),
///     );
///
///     let devices = registry.list_devices(&UserId::from("user-1")).await?;
///     assert_eq!(devices.len(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemoryDeviceRegistry {
    /// Registrations indexed by device id.
    devices: Arc<RwLock<HashMap<DeviceId, DeviceRegistration>>>,
}

impl MemoryDeviceRegistry {
    /// Creates a new empty in-memory registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a registration, replacing any existing record for the same
    /// device id.
    ///
    /// Test-setup helper; not part of the [`DeviceRegistry`] trait.
    pub fn enroll(&self, registration: DeviceRegistration) {
        self.devices.write().insert(registration.device_id.clone(), registration);
    }

    /// Removes a registration by device id, returning it if present.
    ///
    /// Test-setup helper; not part of the [`DeviceRegistry`] trait.
    pub fn remove(&self, device_id: &DeviceId) -> Option<DeviceRegistration> {
        self.devices.write().remove(device_id)
    }
}

#[async_trait]
impl DeviceRegistry for MemoryDeviceRegistry {
    #[tracing::instrument(skip(self))]
    async fn list_devices(&self, user_id: &UserId) -> RegistryResult<Vec<DeviceRegistration>> {
        let devices = self.devices.read();
        Ok(devices.values().filter(|d| d.user_id == *user_id).cloned().collect())
    }

    #[tracing::instrument(skip(self))]
    async fn get_public_key(&self, device_id: &DeviceId) -> RegistryResult<Zeroizing<String>> {
        let devices = self.devices.read();
        devices
            .get(device_id)
            .map(|d| d.public_key.clone())
            .ok_or_else(|| RegistryError::client(format!("unknown device: {device_id}")))
    }
}
