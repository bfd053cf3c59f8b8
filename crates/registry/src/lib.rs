//! Shared device-registry and user-store abstractions for FinAuth services.
//!
//! This crate defines the collaborator boundary used by the device
//! authentication core: the [`DeviceRegistry`] trait for reading device
//! registrations (and their enrolled public keys), and the [`UserStore`]
//! trait for resolving a login identity to an internal user identifier.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐       ┌──────────────────┐
//! │  Authenticator   │──────►│   UserStore      │  login identity → user id
//! │  (authn crate)   │       └──────────────────┘
//! │                  │       ┌──────────────────┐
//! │                  │──────►│  DeviceRegistry  │  user id → registered
//! └──────────────────┘       └──────────────────┘  devices + public keys
//! ```
//!
//! The authentication core only ever *reads* from the registry. Device
//! enrollment and removal are owned by the registration subsystem; the
//! in-memory implementations here expose write access as inherent methods
//! for test setup only.
//!
//! # Quick Start
//!
//! ```
//! use finauth_common_registry::{
//!     DeviceId, DeviceRegistration, DeviceRegistry, MemoryDeviceRegistry, UserId,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = MemoryDeviceRegistry::new();
//!
//!     let device = DeviceRegistration::builder()
//!         .device_id("dev-42")
//!         .user_id("user-001")
//!         .public_key("hw5ZY3cM1b0QzjWjR9tBVcV0dE1nS4a2kP8uXyzGJqc".to_owned())
//!         .build();
//!     registry.enroll(device);
//!
//!     let devices = registry.list_devices(&UserId::from("user-001")).await?;
//!     assert_eq!(devices.len(), 1);
//!     assert_eq!(devices[0].device_id, DeviceId::from("dev-42"));
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! Registry operations return [`RegistryResult<T>`]. Errors are partitioned
//! into client-caused ([`RegistryError::Client`]) and server-caused
//! ([`RegistryError::Server`]) failures; consumers must preserve that
//! partition when translating into their own error taxonomy.

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Device registration record.
pub mod device;
/// Collaborator error types.
pub mod error;
/// Device registry trait and in-memory implementation.
pub mod store;
/// Typed identifiers.
pub mod types;
/// User store trait and local identity resolution.
pub mod users;

// Re-export primary types at crate root for convenience
pub use device::DeviceRegistration;
pub use error::{BoxError, RegistryError, RegistryResult, UserStoreError};
pub use store::{DeviceRegistry, MemoryDeviceRegistry};
pub use types::{DeviceId, UserId};
pub use users::{DEFAULT_TENANT_DOMAIN, LocalIdentity, MemoryUserStore, UserStore};
pub use zeroize::Zeroizing;
