//! Identifier newtypes.
//!
//! Host identifiers are opaque strings (snowflakes, UUIDs, hashes). Wrapping
//! them keeps a scope id from being passed where a user id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Owning scope (community/guild) under which a board is configured.
    ScopeId
);
string_id!(
    /// A content item (message) that can be endorsed.
    ItemId
);
string_id!(
    /// A user identity: content author or endorser.
    UserId
);
string_id!(
    /// A channel/surface inside a scope.
    ChannelId
);
string_id!(
    /// Identifier of a rendered board post.
    PostId
);
