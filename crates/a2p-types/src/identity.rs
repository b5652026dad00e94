//! Identity types for A2P
//!
//! Identifiers are supplied by callers as already-authenticated claims, so
//! they wrap plain strings. Distinct wrappers keep a principal from being
//! passed where a certificate subject is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate string-backed ID types with common implementations
macro_rules! define_id_type {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create from anything string-like
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the identifier is empty or whitespace only
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id_type!(SubjectId, "Identity bound by a certificate: a merchant or an agent");
define_id_type!(PrincipalId, "A human principal who delegates spending authority to an agent");
define_id_type!(TransactionId, "Identifier of an accepted payment");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_raw_string() {
        let id = SubjectId::new("merchant_1");
        assert_eq!(id.to_string(), "merchant_1");
        assert_eq!(id.as_str(), "merchant_1");
    }

    #[test]
    fn test_blank_detection() {
        assert!(SubjectId::new("").is_blank());
        assert!(PrincipalId::new("  ").is_blank());
        assert!(!PrincipalId::new("user").is_blank());
    }

    #[test]
    fn test_serializes_transparently() {
        let id = PrincipalId::from("P1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"P1\"");
    }
}
