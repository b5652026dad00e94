//! Gateway configuration

/// Default length of a transaction id in hex characters
pub const DEFAULT_TRANSACTION_ID_LEN: usize = 16;

const MIN_TRANSACTION_ID_LEN: usize = 16;
const MAX_TRANSACTION_ID_LEN: usize = 64;

/// Configuration for a [`PaymentAuthorizer`](crate::PaymentAuthorizer)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Capability an agent certificate must carry to pay, if any
    pub required_capability: Option<String>,
    /// Hex characters kept from the transaction digest (16..=64)
    pub transaction_id_len: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            required_capability: None,
            transaction_id_len: DEFAULT_TRANSACTION_ID_LEN,
        }
    }
}

impl GatewayConfig {
    /// Read configuration from environment variables, falling back to defaults.
    ///
    /// | Env var | Effect |
    /// |---|---|
    /// | `A2P_REQUIRED_CAPABILITY` | Capability agents need to pay (e.g. `payment`) |
    /// | `A2P_TRANSACTION_ID_LEN` | Transaction id length, clamped to 16..=64 |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let required_capability = lookup("A2P_REQUIRED_CAPABILITY")
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let transaction_id_len = lookup("A2P_TRANSACTION_ID_LEN")
            .and_then(|len| len.trim().parse::<usize>().ok())
            .map(|len| len.clamp(MIN_TRANSACTION_ID_LEN, MAX_TRANSACTION_ID_LEN))
            .unwrap_or(DEFAULT_TRANSACTION_ID_LEN);

        Self {
            required_capability,
            transaction_id_len,
        }
    }

    /// Require agents to hold `capability`
    pub fn requiring(mut self, capability: impl Into<String>) -> Self {
        self.required_capability = Some(capability.into());
        self
    }

    pub(crate) fn id_len(&self) -> usize {
        self.transaction_id_len
            .clamp(MIN_TRANSACTION_ID_LEN, MAX_TRANSACTION_ID_LEN)
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
        assert_eq!(GatewayConfig::from_lookup(lookup(&[])), GatewayConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("A2P_REQUIRED_CAPABILITY", "payment"),
            ("A2P_TRANSACTION_ID_LEN", "32"),
        ]));
        assert_eq!(config.required_capability.as_deref(), Some("payment"));
        assert_eq!(config.transaction_id_len, 32);
    }

    #[test]
    fn test_length_is_clamped() {
        let config = GatewayConfig::from_lookup(lookup(&[("A2P_TRANSACTION_ID_LEN", "2")]));
        assert_eq!(config.transaction_id_len, 16);

        let config = GatewayConfig::from_lookup(lookup(&[("A2P_TRANSACTION_ID_LEN", "8")]));
        assert_eq!(config.transaction_id_len, 16);

        let config = GatewayConfig::from_lookup(lookup(&[("A2P_TRANSACTION_ID_LEN", "500")]));
        assert_eq!(config.transaction_id_len, 64);

        let config = GatewayConfig {
            transaction_id_len: 0,
            ..GatewayConfig::default()
        };
        assert_eq!(config.id_len(), 16);
    }

    #[test]
    fn test_blank_capability_ignored() {
        let config = GatewayConfig::from_lookup(lookup(&[("A2P_REQUIRED_CAPABILITY", "  ")]));
        assert_eq!(config.required_capability, None);
    }
}
