//! Device registration record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::types::{DeviceId, UserId};

/// A device registered for device-bound authentication (Ed25519 only).
///
/// This record stores the public key material enrolled by the device during
/// registration. The corresponding private key never leaves the device's
/// secure keystore.
///
/// # Ownership
///
/// Every registration is bound to exactly one [`UserId`]. A verification
/// token claiming a device id is only trusted after the registry confirms
/// that device belongs to the user the token also claims — the key is
/// associated with the device, the trust decision with the pair.
///
/// # Lifecycle
///
/// Enrollment, renaming and removal are owned by the device-registration
/// subsystem; the authentication core treats records as read-only.
///
/// # Example
///
/// ```
/// use finauth_common_registry::DeviceRegistration;
///
/// let device = DeviceRegistration::builder()
///     .device_id("dev-42")
///     .user_id("user-001")
///     .public_key("hw5ZY3cM1b0QzjWjR9tBVcV0dE1nS4a2kP8uXyzGJqc".to_owned())
///     .display_name("alice's phone".to_owned())
///     .build();
///
/// assert_eq!(device.device_id.as_str(), "dev-42");
/// assert!(device.display_name.is_some());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, bon::Builder)]
#[serde(deny_unknown_fields)]
pub struct DeviceRegistration {
    /// Device identifier assigned at enrollment.
    ///
    /// This is the value a verification token's device claim is matched
    /// against.
    #[builder(into)]
    pub device_id: DeviceId,

    /// Internal identifier of the user that owns this device.
    #[builder(into)]
    pub user_id: UserId,

    /// Ed25519 public key (base64url-encoded, no padding).
    ///
    /// The raw 32-byte Ed25519 public key encoded using base64url without
    /// padding, following RFC 7515 (JWS) conventions — a 32-byte key encodes
    /// to 43 characters.
    ///
    /// Wrapped in [`Zeroizing`] so the key material is scrubbed from memory
    /// when this struct is dropped.
    #[builder(into)]
    pub public_key: Zeroizing<String>,

    /// When the device was enrolled.
    ///
    /// Set once at enrollment and never changes.
    #[builder(default = Utc::now())]
    pub enrolled_at: DateTime<Utc>,

    /// Optional human-readable device name chosen by the user.
    ///
    /// Uses `#[serde(default)]` for backward compatibility: stored records
    /// without this field deserialize with `None`.
    #[serde(default)]
    pub display_name: Option<String>,
}
