//! Authority configuration

use chrono::Duration;

/// Default signer identity of the authority
pub const DEFAULT_AUTHORITY_ID: &str = "AgentDirectory";

/// Default certificate validity window in days
pub const DEFAULT_VALIDITY_DAYS: i64 = 365;

/// Longest validity window accepted from the environment
pub const MAX_VALIDITY_DAYS: i64 = 36_500;

/// Configuration for a [`CertificateAuthority`](crate::CertificateAuthority)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityConfig {
    /// Identity the authority signs as and issues merchant certificates under
    pub authority_id: String,
    /// How long a freshly issued certificate stays valid
    pub validity: Duration,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            authority_id: DEFAULT_AUTHORITY_ID.to_string(),
            validity: Duration::days(DEFAULT_VALIDITY_DAYS),
        }
    }
}

impl AuthorityConfig {
    /// Read configuration from environment variables, falling back to defaults.
    ///
    /// | Env var | Effect |
    /// |---|---|
    /// | `A2P_AUTHORITY_ID` | Signer identity of the authority |
    /// | `A2P_CERT_VALIDITY_DAYS` | Validity window, 1 to 36500 whole days |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let authority_id = lookup("A2P_AUTHORITY_ID")
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or(defaults.authority_id);

        let validity = lookup("A2P_CERT_VALIDITY_DAYS")
            .and_then(|days| days.trim().parse::<i64>().ok())
            .filter(|days| (1..=MAX_VALIDITY_DAYS).contains(days))
            .and_then(Duration::try_days)
            .unwrap_or(defaults.validity);

        Self {
            authority_id,
            validity,
        }
    }

    pub fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AuthorityConfig::from_lookup(lookup(&[]));
        assert_eq!(config, AuthorityConfig::default());
        assert_eq!(config.validity, Duration::days(365));
    }

    #[test]
    fn test_overrides() {
        let config = AuthorityConfig::from_lookup(lookup(&[
            ("A2P_AUTHORITY_ID", "RootCA"),
            ("A2P_CERT_VALIDITY_DAYS", "30"),
        ]));
        assert_eq!(config.authority_id, "RootCA");
        assert_eq!(config.validity, Duration::days(30));
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = AuthorityConfig::from_lookup(lookup(&[
            ("A2P_AUTHORITY_ID", "   "),
            ("A2P_CERT_VALIDITY_DAYS", "-5"),
        ]));
        assert_eq!(config, AuthorityConfig::default());

        let config = AuthorityConfig::from_lookup(lookup(&[("A2P_CERT_VALIDITY_DAYS", "soon")]));
        assert_eq!(config.validity, Duration::days(DEFAULT_VALIDITY_DAYS));
    }

    #[test]
    fn test_out_of_range_validity_falls_back() {
        for days in ["1000000000000", "100000000", "36501", "0"] {
            let config =
                AuthorityConfig::from_lookup(lookup(&[("A2P_CERT_VALIDITY_DAYS", days)]));
            assert_eq!(config.validity, Duration::days(DEFAULT_VALIDITY_DAYS), "{days}");
        }

        let config = AuthorityConfig::from_lookup(lookup(&[("A2P_CERT_VALIDITY_DAYS", "36500")]));
        assert_eq!(config.validity, Duration::days(MAX_VALIDITY_DAYS));
    }
}
