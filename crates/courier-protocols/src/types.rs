//! Identifier types shared across the workspace.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Free-form JSON extras attached to a message.
pub type Extras = HashMap<String, serde_json::Value>;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw numeric value.
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Unique, immutable message identifier assigned by the store.
    MessageId
);
id_type!(
    /// Identifier of the application a message was sent through.
    ApplicationId
);
id_type!(
    /// Identifier of a user; users own applications and receive deliveries.
    UserId
);
