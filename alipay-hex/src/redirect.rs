//! Outbound request builder for the hosted-payment redirect.

use std::collections::BTreeMap;

use alipay_types::domain::amount::format_amount;
use alipay_types::{AcquirerConfig, DomainError, ReturnContext, Transaction};

/// Builds the fields posted to the gateway's hosted-payment page.
///
/// Fees only travel as `handling`; the return URL only travels inside the
/// JSON-encoded `custom` field, which the gateway echoes back untouched.
pub fn build_redirect_fields(
    config: &AcquirerConfig,
    tx: &Transaction,
    buyer_email: &str,
    return_url: &str,
    notify_url: &str,
) -> Result<BTreeMap<String, String>, DomainError> {
    let mut fields: BTreeMap<String, String> = [
        ("out_trade_no", tx.reference.clone()),
        ("subject", tx.reference.clone()),
        ("logistics_type", "DIRECT".to_string()),
        ("logistics_fee", "0".to_string()),
        ("logistics_payment", "SELLER_PAY".to_string()),
        ("service", "create_direct_pay_by_user".to_string()),
        ("payment_type", "1".to_string()),
        // Partner/seller crossover mirrors the acquirer's configuration schema.
        ("partner", config.alipay_seller_email.clone()),
        ("seller_email", config.alipay_partner_account.clone()),
        ("_input_charset", "utf-8".to_string()),
        ("body", format!("{}: {}", config.company_name, tx.reference)),
        ("total_fee", format_amount(tx.amount)),
        ("payment_method", "directPay".to_string()),
        ("defaultbank", String::new()),
        ("anti_phishing_key", String::new()),
        ("buyer_email", buyer_email.to_string()),
        ("extra_common_param", String::new()),
        ("royalty_type", String::new()),
        ("royalty_parameters", String::new()),
        ("notify_url", notify_url.to_string()),
        ("show_url", String::new()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    if tx.has_fees() {
        fields.insert("handling".into(), format_amount(tx.fees));
    }

    if !return_url.is_empty() {
        fields.insert("custom".into(), encode_return_context(return_url)?);
    }

    Ok(fields)
}

/// Serializes `{"return_url": ...}` for the `custom` field.
pub fn encode_return_context(return_url: &str) -> Result<String, DomainError> {
    serde_json::to_string(&ReturnContext {
        return_url: return_url.to_string(),
    })
    .map_err(|e| DomainError::ValidationError(format!("cannot encode return context: {e}")))
}

/// Recovers the return context echoed by the gateway.
pub fn decode_return_context(custom: &str) -> Result<ReturnContext, DomainError> {
    serde_json::from_str(custom)
        .map_err(|e| DomainError::ValidationError(format!("malformed custom field: {e}")))
}
