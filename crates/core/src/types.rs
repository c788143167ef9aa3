use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! newtype_string {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string value.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Return the inner string as a str slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

newtype_string!(GuildId, "Identifies the chat server the gate operates on.");
newtype_string!(UserId, "A platform user identifier.");
newtype_string!(ChannelId, "A platform channel identifier.");
newtype_string!(RoleId, "A platform role identifier.");
newtype_string!(RecordId, "A unique verification record identifier.");
newtype_string!(AppealId, "A unique ban appeal identifier.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_from_str() {
        let user = UserId::from("1093847561203");
        assert_eq!(user.as_str(), "1093847561203");
        assert_eq!(&*user, "1093847561203");
    }

    #[test]
    fn newtype_from_string() {
        let role = RoleId::from("role-13plus".to_string());
        assert_eq!(role.to_string(), "role-13plus");
    }

    #[test]
    fn newtype_serde_roundtrip() {
        let id = RecordId::new("rec-123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"rec-123\"");
        let back: RecordId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn newtype_display() {
        let ch = ChannelId::new("mod-log");
        assert_eq!(format!("{ch}"), "mod-log");
    }
}
