//! Supported acquirers and the registry built at startup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Payment providers this service can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Alipay,
}

impl Provider {
    /// Every provider compiled into this build.
    pub const ALL: [Provider; 1] = [Provider::Alipay];

    /// Stable code used in URLs and storage.
    pub fn code(&self) -> &'static str {
        match self {
            Provider::Alipay => "alipay",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Alipay => "Alipay",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.code() == s)
            .ok_or_else(|| format!("unknown provider '{s}'"))
    }
}

/// Immutable map of enabled providers, assembled once at startup.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<Provider, &'static str>,
}

impl ProviderRegistry {
    /// Registry with every compiled-in provider enabled.
    pub fn with_all() -> Self {
        Provider::ALL
            .into_iter()
            .fold(Self::default(), |registry, p| registry.register(p))
    }

    /// Adds a provider; used while building the registry.
    pub fn register(mut self, provider: Provider) -> Self {
        self.providers.insert(provider, provider.display_name());
        self
    }

    pub fn is_enabled(&self, provider: Provider) -> bool {
        self.providers.contains_key(&provider)
    }

    /// `(code, display name)` pairs, sorted by provider.
    pub fn list(&self) -> Vec<(&'static str, &'static str)> {
        self.providers.iter().map(|(p, name)| (p.code(), *name)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lists_alipay() {
        let registry = ProviderRegistry::with_all();
        assert!(registry.is_enabled(Provider::Alipay));
        assert_eq!(registry.list(), vec![("alipay", "Alipay")]);
    }

    #[test]
    fn test_empty_registry_enables_nothing() {
        assert!(!ProviderRegistry::default().is_enabled(Provider::Alipay));
    }

    #[test]
    fn test_provider_from_code() {
        assert_eq!("alipay".parse::<Provider>().unwrap(), Provider::Alipay);
        assert!("paypal".parse::<Provider>().is_err());
    }
}
