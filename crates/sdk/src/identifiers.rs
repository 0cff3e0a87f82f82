//! Newtype domain identifiers.
//!
//! Every resource the IAM and notifications services expose is addressed by an
//! opaque string id. Each kind of id is a distinct newtype so a [`UserId`]
//! cannot be passed where a [`GroupId`] is expected, even though both are
//! strings on the wire.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: server-assigned
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies a user account in the IAM service.
    ///
    /// Assigned by the service on creation and returned through the
    /// `Location` header of the create call.
    UserId
}

string_id! {
    /// Identifies a group of users sharing a set of scopes.
    GroupId
}

string_id! {
    /// Identifies a scope: a named permission grouping used when issuing tokens.
    ScopeId
}

string_id! {
    /// Identifies a device registered by a user (phone, browser, ...).
    DeviceId
}

string_id! {
    /// Identifies a notification template in the notifications service.
    NotificationId
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single outbound request.
///
/// Generated fresh for every dispatched call; sent as `X-Request-Id` and
/// recorded on the request span so client and server logs can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a new random request identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
