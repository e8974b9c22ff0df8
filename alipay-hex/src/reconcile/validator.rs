//! Cross-checks a notification against the transaction it matched.

use alipay_types::domain::amount::{amounts_match, format_amount, parse_amount};
use alipay_types::domain::{REQUIRED_NOTIFY_VERSION, fields};
use alipay_types::{AcquirerConfig, Discrepancy, Notification, Transaction};
use rust_decimal::Decimal;

/// Returns every field that disagrees with what `tx` and `config` expect.
///
/// All checks run; an empty list means the notification is consistent.
/// Protocol-version drift and sandbox notifications are logged as warnings
/// and never count as discrepancies.
pub fn validate_fields(
    tx: &Transaction,
    config: &AcquirerConfig,
    notification: &Notification,
) -> Vec<Discrepancy> {
    let mut invalid = Vec::new();

    let version = notification.get(fields::NOTIFY_VERSION);
    if version != Some(REQUIRED_NOTIFY_VERSION) {
        tracing::warn!(
            reference = %tx.reference,
            version = version.unwrap_or("None"),
            "Received a notification from Alipay with version {} instead of {}. This could lead to issues when managing it.",
            version.unwrap_or("None"),
            REQUIRED_NOTIFY_VERSION
        );
    }
    if notification.is_sandbox() {
        tracing::warn!(reference = %tx.reference, "Received a notification from Alipay using sandbox");
    }

    // Gateway transaction id is unset until the first confirmation.
    if let Some(expected) = tx.acquirer_reference.as_deref().filter(|r| !r.is_empty()) {
        let received = notification.get(fields::TXN_ID);
        if received != Some(expected) {
            invalid.push(Discrepancy::new(fields::TXN_ID, received, expected));
        }
    }

    // mc_gross is amount + fees
    let expected_gross = tx.expected_gross();
    let received_gross = notification.get(fields::MC_GROSS);
    if !amount_matches(received_gross, expected_gross) {
        invalid.push(Discrepancy::new(
            fields::MC_GROSS,
            received_gross,
            format_amount(expected_gross),
        ));
    }

    let currency = notification.get(fields::MC_CURRENCY);
    if currency != Some(tx.currency.as_str()) {
        invalid.push(Discrepancy::new(
            fields::MC_CURRENCY,
            currency,
            tx.currency.as_str(),
        ));
    }

    if let Some(handling) = notification.get(fields::HANDLING_AMOUNT) {
        if !amount_matches(Some(handling), tx.fees) {
            invalid.push(Discrepancy::new(
                fields::HANDLING_AMOUNT,
                Some(handling),
                format_amount(tx.fees),
            ));
        }
    }

    // check buyer
    if let Some(expected) = tx.partner_reference.as_deref().filter(|r| !r.is_empty()) {
        let received = notification.get(fields::PAYER_ID);
        if received != Some(expected) {
            invalid.push(Discrepancy::new(fields::PAYER_ID, received, expected));
        }
    }

    // check seller; the gateway names these the other way round from the config schema
    let receiver_email = notification.get(fields::RECEIVER_EMAIL);
    if receiver_email != Some(config.alipay_partner_account.as_str()) {
        invalid.push(Discrepancy::new(
            fields::RECEIVER_EMAIL,
            receiver_email,
            config.alipay_partner_account.as_str(),
        ));
    }
    if let Some(receiver_id) = notification.non_empty(fields::RECEIVER_ID) {
        let seller = config.alipay_seller_email.as_str();
        if !seller.is_empty() && receiver_id != seller {
            invalid.push(Discrepancy::new(
                fields::RECEIVER_ID,
                Some(receiver_id),
                seller,
            ));
        }
    }

    invalid
}

fn amount_matches(received: Option<&str>, expected: Decimal) -> bool {
    received
        .and_then(parse_amount)
        .is_some_and(|amount| amounts_match(amount, expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alipay_types::{AcquirerId, Environment, FeeSchedule};
    use rust_decimal_macros::dec;

    fn config() -> AcquirerConfig {
        AcquirerConfig {
            id: AcquirerId::new(),
            company_name: "Acme".into(),
            alipay_partner_account: "2088000000000000".into(),
            alipay_partner_key: "key".into(),
            alipay_seller_email: "seller@example.com".into(),
            environment: Environment::Sandbox,
            fees: FeeSchedule::default(),
        }
    }

    fn transaction() -> Transaction {
        Transaction::new(
            "SO042".into(),
            AcquirerId::new(),
            dec!(100.00),
            "USD".into(),
            dec!(0),
            "buyer@example.com".into(),
        )
        .unwrap()
    }

    fn notification(overrides: &[(&str, &str)]) -> Notification {
        let mut raw: std::collections::HashMap<String, String> = [
            (fields::ITEM_NUMBER, "SO042"),
            (fields::TXN_ID, "T1"),
            (fields::NOTIFY_VERSION, "3.4"),
            (fields::PAYMENT_STATUS, "Completed"),
            (fields::MC_GROSS, "100.00"),
            (fields::MC_CURRENCY, "USD"),
            (fields::PAYER_ID, "P1"),
            (fields::RECEIVER_EMAIL, "2088000000000000"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in overrides {
            raw.insert(k.to_string(), v.to_string());
        }
        Notification::new(raw)
    }

    #[test]
    fn test_consistent_notification_has_no_discrepancy() {
        assert!(validate_fields(&transaction(), &config(), &notification(&[])).is_empty());
    }

    #[test]
    fn test_gross_mismatch_reported() {
        let found = validate_fields(
            &transaction(),
            &config(),
            &notification(&[(fields::MC_GROSS, "99.00")]),
        );
        assert_eq!(
            found,
            vec![Discrepancy::new(fields::MC_GROSS, Some("99.00"), "100.00")]
        );
    }

    #[test]
    fn test_gross_includes_fees() {
        let mut tx = transaction();
        tx.fees = dec!(3.83);
        let n = notification(&[(fields::MC_GROSS, "103.83"), (fields::HANDLING_AMOUNT, "3.83")]);
        assert!(validate_fields(&tx, &config(), &n).is_empty());

        let n = notification(&[(fields::MC_GROSS, "103.83"), (fields::HANDLING_AMOUNT, "3.00")]);
        let found = validate_fields(&tx, &config(), &n);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].field, fields::HANDLING_AMOUNT);
        assert_eq!(found[0].expected, "3.83");
    }

    #[test]
    fn test_out_of_range_gross_does_not_panic() {
        let mut tx = transaction();
        tx.amount = Decimal::MAX;
        tx.fees = dec!(1);
        let found = validate_fields(&tx, &config(), &notification(&[]));
        assert_eq!(found[0].field, fields::MC_GROSS);
    }

    #[test]
    fn test_unparseable_gross_is_a_discrepancy() {
        let found = validate_fields(
            &transaction(),
            &config(),
            &notification(&[(fields::MC_GROSS, "one hundred")]),
        );
        assert_eq!(found[0].field, fields::MC_GROSS);
    }

    #[test]
    fn test_all_checks_run_without_short_circuit() {
        let mut tx = transaction();
        tx.acquirer_reference = Some("T0".into());
        tx.partner_reference = Some("P0".into());
        let n = notification(&[
            (fields::MC_GROSS, "1.00"),
            (fields::MC_CURRENCY, "EUR"),
            (fields::RECEIVER_EMAIL, "someone@else"),
            (fields::RECEIVER_ID, "other-seller"),
        ]);
        let found: Vec<String> = validate_fields(&tx, &config(), &n)
            .into_iter()
            .map(|d| d.field)
            .collect();
        assert_eq!(
            found,
            vec![
                fields::TXN_ID,
                fields::MC_GROSS,
                fields::MC_CURRENCY,
                fields::PAYER_ID,
                fields::RECEIVER_EMAIL,
                fields::RECEIVER_ID,
            ]
        );
    }

    #[test]
    fn test_first_notification_exempt_from_reference_checks() {
        let n = notification(&[(fields::TXN_ID, "ANY"), (fields::PAYER_ID, "ANYONE")]);
        assert!(validate_fields(&transaction(), &config(), &n).is_empty());
    }

    #[test]
    fn test_warnings_do_not_count() {
        let n = notification(&[(fields::NOTIFY_VERSION, "2.6"), (fields::TEST_IPN, "1")]);
        assert!(validate_fields(&transaction(), &config(), &n).is_empty());
    }

    #[test]
    fn test_missing_receiver_email_is_a_discrepancy() {
        let mut n = notification(&[]).into_inner();
        n.remove(fields::RECEIVER_EMAIL);
        let found = validate_fields(&transaction(), &config(), &Notification::new(n));
        assert_eq!(
            found,
            vec![Discrepancy::new(
                fields::RECEIVER_EMAIL,
                None,
                "2088000000000000"
            )]
        );
    }

    #[test]
    fn test_receiver_id_ignored_without_configured_seller() {
        let mut config = config();
        config.alipay_seller_email = String::new();
        let n = notification(&[(fields::RECEIVER_ID, "whoever")]);
        assert!(validate_fields(&transaction(), &config, &n).is_empty());
    }

    #[test]
    fn test_validation_is_repeatable() {
        let tx = transaction();
        let n = notification(&[(fields::MC_CURRENCY, "CNY")]);
        assert_eq!(
            validate_fields(&tx, &config(), &n),
            validate_fields(&tx, &config(), &n)
        );
    }
}
