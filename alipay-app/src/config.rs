//! Configuration loading from environment.

use std::env;
use std::str::FromStr;

use rust_decimal::Decimal;

use alipay_types::{AcquirerConfig, AcquirerId, Environment, FeeSchedule};

/// Application configuration.
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Public base URL the gateway calls back on (notify and return URLs).
    pub public_base_url: String,
    pub acquirer: AcquirerConfig,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// The acquirer configuration is validated here so a bad fee schedule or
    /// missing credential stops the process before it accepts traffic.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = var("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()?;

        let database_url = var("DATABASE_URL").unwrap_or_else(|| "memory://".to_string());

        let public_base_url = var("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        let id = match var("ALIPAY_ACQUIRER_ID") {
            Some(raw) => AcquirerId::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("ALIPAY_ACQUIRER_ID is not a UUID: {e}"))?,
            None => AcquirerId::new(),
        };

        let environment = match var("ALIPAY_ENVIRONMENT") {
            Some(raw) => Environment::from_str(&raw)?,
            None => Environment::default(),
        };

        let fees = FeeSchedule {
            fees_active: var("ALIPAY_FEES_ACTIVE")
                .map(|raw| matches!(raw.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),
            domestic_fixed: decimal(&var, "ALIPAY_FEES_DOM_FIXED")?,
            domestic_variable_pct: decimal(&var, "ALIPAY_FEES_DOM_VAR")?,
            international_fixed: decimal(&var, "ALIPAY_FEES_INT_FIXED")?,
            international_variable_pct: decimal(&var, "ALIPAY_FEES_INT_VAR")?,
        };

        let acquirer = AcquirerConfig {
            id,
            company_name: var("ALIPAY_COMPANY_NAME").unwrap_or_default(),
            alipay_partner_account: required(&var, "ALIPAY_PARTNER_ACCOUNT")?,
            alipay_partner_key: required(&var, "ALIPAY_PARTNER_KEY")?,
            alipay_seller_email: required(&var, "ALIPAY_SELLER_EMAIL")?,
            environment,
            fees,
        };
        acquirer.validate()?;

        Ok(Self {
            port,
            database_url,
            public_base_url,
            acquirer,
        })
    }
}

fn required(var: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<String> {
    var(key).ok_or_else(|| anyhow::anyhow!("{key} environment variable is required"))
}

fn decimal(var: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Decimal> {
    match var(key) {
        Some(raw) => Decimal::from_str(raw.trim())
            .map_err(|e| anyhow::anyhow!("{key} is not a decimal: {e}")),
        None => Ok(Decimal::ZERO),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    const CREDENTIALS: [(&str, &str); 3] = [
        ("ALIPAY_PARTNER_ACCOUNT", "2088000000000000"),
        ("ALIPAY_PARTNER_KEY", "secret"),
        ("ALIPAY_SELLER_EMAIL", "seller@example.com"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(&CREDENTIALS).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.database_url, "memory://");
        assert_eq!(config.public_base_url, "http://localhost:3000");
        assert_eq!(config.acquirer.environment, Environment::Sandbox);
        assert!(!config.acquirer.fees.fees_active);
    }

    #[test]
    fn test_fee_schedule_from_env() {
        let mut pairs = CREDENTIALS.to_vec();
        pairs.extend([
            ("ALIPAY_ENVIRONMENT", "prod"),
            ("ALIPAY_FEES_ACTIVE", "true"),
            ("ALIPAY_FEES_DOM_FIXED", "0.35"),
            ("ALIPAY_FEES_DOM_VAR", "3.4"),
            ("PUBLIC_BASE_URL", "https://shop.example.com/"),
        ]);
        let config = load(&pairs).unwrap();
        assert_eq!(config.acquirer.environment, Environment::Production);
        assert!(config.acquirer.fees.fees_active);
        assert_eq!(config.acquirer.fees.domestic_fixed, dec!(0.35));
        assert_eq!(config.acquirer.fees.domestic_variable_pct, dec!(3.4));
        assert_eq!(config.public_base_url, "https://shop.example.com");
    }

    #[test]
    fn test_missing_credentials_rejected() {
        assert!(load(&[("ALIPAY_PARTNER_KEY", "secret")]).is_err());
    }

    #[test]
    fn test_invalid_fee_percentage_rejected() {
        let mut pairs = CREDENTIALS.to_vec();
        pairs.extend([("ALIPAY_FEES_ACTIVE", "1"), ("ALIPAY_FEES_INT_VAR", "100")]);
        assert!(load(&pairs).is_err());
    }
}
