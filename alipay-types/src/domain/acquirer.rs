//! Acquirer configuration and fee schedule.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Unique identifier for an acquirer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AcquirerId(Uuid);

impl AcquirerId {
    /// Creates a new random AcquirerId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an AcquirerId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AcquirerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AcquirerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AcquirerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Gateway environment; selects the hosted-payment base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Environment {
    #[default]
    #[serde(rename = "sandbox")]
    Sandbox,
    #[serde(rename = "prod")]
    Production,
}

impl Environment {
    /// Form action URL of the hosted-payment page.
    pub fn gateway_url(&self) -> &'static str {
        match self {
            Environment::Production => "https://mapi.alipay.com/gateway.do?",
            Environment::Sandbox => "https://openapi.alipaydev.com/gateway.do",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Sandbox => "sandbox",
            Environment::Production => "prod",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" | "test" => Ok(Environment::Sandbox),
            "prod" | "production" => Ok(Environment::Production),
            other => Err(DomainError::Configuration(format!(
                "unknown environment '{other}'"
            ))),
        }
    }
}

/// Fee schedule applied on top of the order amount.
///
/// Percentages are expressed in percent (`3.4` means 3.4 %).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub fees_active: bool,
    pub domestic_fixed: Decimal,
    pub domestic_variable_pct: Decimal,
    pub international_fixed: Decimal,
    pub international_variable_pct: Decimal,
}

impl FeeSchedule {
    /// Checks the schedule cannot produce infinite or negative fees.
    pub fn validate(&self) -> Result<(), DomainError> {
        for (name, pct) in [
            ("domestic_variable_pct", self.domestic_variable_pct),
            ("international_variable_pct", self.international_variable_pct),
        ] {
            if pct < Decimal::ZERO || pct >= Decimal::ONE_HUNDRED {
                return Err(DomainError::Configuration(format!(
                    "{name} must be in [0, 100), got {pct}"
                )));
            }
        }
        for (name, fixed) in [
            ("domestic_fixed", self.domestic_fixed),
            ("international_fixed", self.international_fixed),
        ] {
            if fixed < Decimal::ZERO {
                return Err(DomainError::Configuration(format!(
                    "{name} cannot be negative, got {fixed}"
                )));
            }
        }
        Ok(())
    }

    /// Grosses up `amount` so that the merchant receives it net of fees.
    ///
    /// `is_domestic` is true when the merchant and buyer countries match.
    pub fn compute(&self, amount: Decimal, is_domestic: bool) -> Result<Decimal, DomainError> {
        if !self.fees_active {
            return Ok(Decimal::ZERO);
        }
        let (percentage, fixed) = if is_domestic {
            (self.domestic_variable_pct, self.domestic_fixed)
        } else {
            (self.international_variable_pct, self.international_fixed)
        };
        let rate = percentage / Decimal::ONE_HUNDRED;
        let denominator = Decimal::ONE - rate;
        if denominator <= Decimal::ZERO {
            return Err(DomainError::Configuration(format!(
                "variable fee of {percentage}% leaves nothing to charge"
            )));
        }
        rate.checked_mul(amount)
            .and_then(|variable| variable.checked_add(fixed))
            .and_then(|gross| gross.checked_div(denominator))
            .ok_or_else(|| {
                DomainError::ValidationError(format!("Fees for amount {amount} are out of range"))
            })
    }
}

/// Per-merchant Alipay credentials and settings.
///
/// Created and edited outside this crate; read-only to the payment core.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquirerConfig {
    pub id: AcquirerId,
    /// Company shown in the order description sent to the gateway.
    pub company_name: String,
    /// Alipay partner id.
    pub alipay_partner_account: String,
    /// Shared secret. Never logged.
    pub alipay_partner_key: String,
    pub alipay_seller_email: String,
    pub environment: Environment,
    pub fees: FeeSchedule,
}

impl AcquirerConfig {
    /// Fails fast on settings the payment core cannot work with.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.alipay_partner_account.trim().is_empty() {
            return Err(DomainError::Configuration(
                "alipay_partner_account is required".into(),
            ));
        }
        if self.alipay_seller_email.trim().is_empty() {
            return Err(DomainError::Configuration(
                "alipay_seller_email is required".into(),
            ));
        }
        self.fees.validate()
    }

    /// Computes the fees for `amount`. Always zero while fees are inactive.
    pub fn compute_fees(&self, amount: Decimal, is_domestic: bool) -> Result<Decimal, DomainError> {
        self.fees.compute(amount, is_domestic)
    }

    pub fn gateway_url(&self) -> &'static str {
        self.environment.gateway_url()
    }
}

impl std::fmt::Debug for AcquirerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcquirerConfig")
            .field("id", &self.id)
            .field("company_name", &self.company_name)
            .field("alipay_partner_account", &self.alipay_partner_account)
            .field("alipay_partner_key", &"***")
            .field("alipay_seller_email", &self.alipay_seller_email)
            .field("environment", &self.environment)
            .field("fees", &self.fees)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn schedule() -> FeeSchedule {
        FeeSchedule {
            fees_active: true,
            domestic_fixed: dec!(0.30),
            domestic_variable_pct: dec!(3.4),
            international_fixed: dec!(0.50),
            international_variable_pct: dec!(3.9),
        }
    }

    #[test]
    fn test_inactive_fees_are_always_zero() {
        let fees = FeeSchedule {
            fees_active: false,
            ..schedule()
        };
        for amount in [dec!(0), dec!(1), dec!(1234.56)] {
            assert_eq!(fees.compute(amount, true).unwrap(), Decimal::ZERO);
            assert_eq!(fees.compute(amount, false).unwrap(), Decimal::ZERO);
        }
    }

    #[test]
    fn test_domestic_and_international_rates_differ() {
        let fees = schedule();
        // (0.034 * 100 + 0.30) / 0.966
        let domestic = fees.compute(dec!(100), true).unwrap().round_dp(4);
        assert_eq!(domestic, dec!(3.8302));
        // (0.039 * 100 + 0.50) / 0.961
        let international = fees.compute(dec!(100), false).unwrap().round_dp(4);
        assert_eq!(international, dec!(4.5786));
    }

    #[test]
    fn test_hundred_percent_is_a_configuration_error() {
        let fees = FeeSchedule {
            domestic_variable_pct: dec!(100),
            ..schedule()
        };
        assert!(matches!(
            fees.compute(dec!(10), true),
            Err(DomainError::Configuration(_))
        ));
        assert!(matches!(fees.validate(), Err(DomainError::Configuration(_))));
    }

    #[test]
    fn test_fee_overflow_is_an_error() {
        let fees = FeeSchedule {
            international_variable_pct: dec!(90),
            ..schedule()
        };
        assert!(matches!(
            fees.compute(Decimal::MAX, false),
            Err(DomainError::ValidationError(_))
        ));
    }

    #[test]
    fn test_negative_fixed_fee_rejected() {
        let fees = FeeSchedule {
            international_fixed: dec!(-1),
            ..schedule()
        };
        assert!(fees.validate().is_err());
    }

    #[test]
    fn test_gateway_url_per_environment() {
        assert_eq!(
            Environment::Production.gateway_url(),
            "https://mapi.alipay.com/gateway.do?"
        );
        assert_eq!(
            Environment::Sandbox.gateway_url(),
            "https://openapi.alipaydev.com/gateway.do"
        );
        assert_eq!("PROD".parse::<Environment>().unwrap(), Environment::Production);
    }

    #[test]
    fn test_debug_redacts_partner_key() {
        let config = AcquirerConfig {
            id: AcquirerId::new(),
            company_name: "Acme".into(),
            alipay_partner_account: "2088000000000000".into(),
            alipay_partner_key: "super-secret".into(),
            alipay_seller_email: "seller@example.com".into(),
            environment: Environment::Sandbox,
            fees: FeeSchedule::default(),
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(config.validate().is_ok());
    }
}
