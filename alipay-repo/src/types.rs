//! Database row types for the SQLite adapter.
//!
//! Decimals and timestamps are stored as TEXT and parsed back here.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use alipay_types::{
    AcquirerConfig, AcquirerId, Environment, FeeSchedule, RepoError, Transaction, TransactionId,
    TransactionState,
};

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// Transaction row from database.
#[derive(FromRow)]
pub struct DbTransaction {
    pub id: String,
    pub reference: String,
    pub acquirer_id: String,
    pub amount: String,
    pub currency: String,
    pub fees: String,
    pub buyer_email: String,
    pub acquirer_reference: Option<String>,
    pub partner_reference: Option<String>,
    pub alipay_txn_type: Option<String>,
    pub state: String,
    pub state_message: Option<String>,
    pub date_validated: Option<String>,
    pub created_at: String,
    pub version: i64,
}

impl DbTransaction {
    pub fn into_domain(self) -> Result<Transaction, RepoError> {
        Ok(Transaction {
            id: TransactionId::from_uuid(parse_uuid(&self.id)?),
            reference: self.reference,
            acquirer_id: AcquirerId::from_uuid(parse_uuid(&self.acquirer_id)?),
            amount: parse_decimal(&self.amount)?,
            currency: self.currency,
            fees: parse_decimal(&self.fees)?,
            buyer_email: self.buyer_email,
            acquirer_reference: self.acquirer_reference,
            partner_reference: self.partner_reference,
            alipay_txn_type: self.alipay_txn_type,
            state: TransactionState::from_str(&self.state).map_err(RepoError::Domain)?,
            state_message: self.state_message,
            date_validated: self.date_validated.as_deref().map(parse_timestamp).transpose()?,
            created_at: parse_timestamp(&self.created_at)?,
            version: self.version,
        })
    }
}

/// Acquirer configuration row from database.
#[derive(FromRow)]
pub struct DbAcquirerConfig {
    pub id: String,
    pub company_name: String,
    pub alipay_partner_account: String,
    pub alipay_partner_key: String,
    pub alipay_seller_email: String,
    pub environment: String,
    pub fees_active: bool,
    pub fees_dom_fixed: String,
    pub fees_dom_var: String,
    pub fees_int_fixed: String,
    pub fees_int_var: String,
}

impl DbAcquirerConfig {
    pub fn into_domain(self) -> Result<AcquirerConfig, RepoError> {
        Ok(AcquirerConfig {
            id: AcquirerId::from_uuid(parse_uuid(&self.id)?),
            company_name: self.company_name,
            alipay_partner_account: self.alipay_partner_account,
            alipay_partner_key: self.alipay_partner_key,
            alipay_seller_email: self.alipay_seller_email,
            environment: Environment::from_str(&self.environment).map_err(RepoError::Domain)?,
            fees: FeeSchedule {
                fees_active: self.fees_active,
                domestic_fixed: parse_decimal(&self.fees_dom_fixed)?,
                domestic_variable_pct: parse_decimal(&self.fees_dom_var)?,
                international_fixed: parse_decimal(&self.fees_int_fixed)?,
                international_variable_pct: parse_decimal(&self.fees_int_var)?,
            },
        })
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid, RepoError> {
    Uuid::parse_str(raw).map_err(|e| RepoError::Database(e.to_string()))
}

fn parse_decimal(raw: &str) -> Result<Decimal, RepoError> {
    Decimal::from_str(raw).map_err(|e| RepoError::Database(format!("bad decimal '{raw}': {e}")))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepoError::Database(e.to_string()))
}
