//! Newtype wrappers for string identifiers, providing compile-time type safety.
//!
//! All newtypes serialize/deserialize as plain strings for manifest compatibility.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<String> for $name {
            fn eq(&self, other: &String) -> bool {
                self.0 == *other
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
    };
}

string_newtype!(
    /// Hex-encoded blake3 checksum of a dependency artifact, the key of the
    /// content-addressed cache.
    Checksum
);

string_newtype!(
    /// Name of a dependency in the manifest catalog (e.g. "go").
    DepName
);

impl Checksum {
    /// A checksum is 64 lowercase hex characters (blake3).
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == 64 && self.0.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_display_and_as_ref() {
        let c = Checksum::new("abc123");
        assert_eq!(c.to_string(), "abc123");
        assert_eq!(c.as_str(), "abc123");
        assert_eq!(AsRef::<str>::as_ref(&c), "abc123");
    }

    #[test]
    fn checksum_serde_roundtrip() {
        let c = Checksum::new("deadbeef");
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "\"deadbeef\"");
        let back: Checksum = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn checksum_well_formed() {
        let good = Checksum::new("a".repeat(64));
        assert!(good.is_well_formed());
        let short = Checksum::new("abc");
        assert!(!short.is_well_formed());
        let bad_chars = Checksum::new("z".repeat(64));
        assert!(!bad_chars.is_well_formed());
    }

    #[test]
    fn dep_name_from_string() {
        let s = String::from("go");
        let n: DepName = s.into();
        assert_eq!(n.as_str(), "go");
    }

    #[test]
    fn dep_name_equality() {
        let a = DepName::new("go");
        let b = DepName::new("go");
        let c = DepName::new("node");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, "go");
    }
}
