//! Data Transfer Objects (DTOs) for requests and responses.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::AcquirerId;

// ─────────────────────────────────────────────────────────────────────────────
// Checkout DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request from the checkout flow to open a payment transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    /// Merchant order reference
    pub reference: String,
    pub acquirer_id: AcquirerId,
    /// Order amount, excluding fees
    pub amount: Decimal,
    /// ISO 4217 currency code
    pub currency: String,
    pub buyer_email: String,
    /// Whether the buyer's country is the merchant's country
    #[serde(default)]
    pub is_domestic: bool,
}

/// Hosted-payment redirect: where to post and what to post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectForm {
    pub action_url: String,
    pub fields: BTreeMap<String, String>,
}

/// Context round-tripped through the gateway in the `custom` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnContext {
    pub return_url: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// An enabled payment provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub code: String,
    pub name: String,
}
