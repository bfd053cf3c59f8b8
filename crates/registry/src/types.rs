//! Typed identifiers shared across registry operations.
//!
//! Device and user identifiers in this domain are opaque strings assigned by
//! the enrollment subsystem and the user store respectively. Wrapping them in
//! newtypes prevents accidental cross-use — passing a `DeviceId` where a
//! `UserId` is expected is a compile-time error.

/// Macro to define a newtype wrapper around `String` with standard trait
/// implementations.
///
/// Each generated type:
/// - Is a transparent wrapper around `String`
/// - Derives `Clone`, `Debug`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Derives `Serialize` and `Deserialize` (transparent)
/// - Implements `From<String>` and `From<&str>`
/// - Implements `Display` that outputs the inner value
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Internal user identifier assigned by the user store.
    ///
    /// This is the identifier device registrations are keyed by — it is
    /// resolved from a login identity via
    /// [`UserStore::lookup_user_id`](crate::users::UserStore::lookup_user_id)
    /// and is not the user-facing login name.
    ///
    /// # Examples
    ///
    /// ```
    /// use finauth_common_registry::UserId;
    ///
    /// let user = UserId::from("8f14e45f-ceea-467f-a1d5");
    /// assert_eq!(user.as_str(), "8f14e45f-ceea-467f-a1d5");
    /// ```
    UserId
);

define_id!(
    /// Device identifier assigned at enrollment time.
    ///
    /// Uniquely identifies a registered device within the registry. Tokens
    /// claim a device id; the claim is only trusted after the registry
    /// confirms the device belongs to the resolved user.
    ///
    /// # Examples
    ///
    /// ```
    /// use finauth_common_registry::DeviceId;
    ///
    /// let device = DeviceId::from("dev-42");
    /// assert_eq!(device.to_string(), "dev-42");
    /// ```
    DeviceId
);
