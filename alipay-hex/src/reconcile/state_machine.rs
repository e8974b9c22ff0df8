//! Drives a transaction to its next state from a validated notification.

use alipay_types::domain::fields;
use alipay_types::{Discrepancy, DomainError, Notification, Transaction, TransactionState};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Gateway-local time used by `payment_date` when it carries no offset (UTC+8).
const GATEWAY_UTC_OFFSET_SECS: i32 = 8 * 3600;

/// Result of applying a notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The transaction moved (or was re-evaluated) and must be persisted.
    Applied(Transaction),
    /// The transaction is final; the notification is acknowledged without change.
    Unchanged(Transaction),
}

/// Maps the notification's `payment_status` onto `tx`.
///
/// `Completed`/`Processed` confirm the payment and capture the gateway
/// references; `Pending`/`Expired` keep it pending with the gateway's reason;
/// any other status sets the transaction in error. Fails with
/// `DomainError::Validation` if `discrepancies` is not empty.
pub fn apply_notification(
    tx: &Transaction,
    notification: &Notification,
    discrepancies: &[Discrepancy],
    now: DateTime<Utc>,
) -> Result<Transition, DomainError> {
    if !discrepancies.is_empty() {
        return Err(DomainError::Validation {
            reference: tx.reference.clone(),
            discrepancies: discrepancies.to_vec(),
        });
    }

    let status = notification.payment_status();
    let target = match status {
        Some("Completed") | Some("Processed") => TransactionState::Done,
        Some("Pending") | Some("Expired") => TransactionState::Pending,
        _ => TransactionState::Error,
    };

    if !tx.state.can_transition_to(target) {
        tracing::warn!(
            reference = %tx.reference,
            state = %tx.state,
            status = status.unwrap_or("None"),
            "Ignoring Alipay notification for a transaction already {}",
            tx.state
        );
        return Ok(Transition::Unchanged(tx.clone()));
    }

    let mut next = tx.clone();
    next.state = target;
    match target {
        TransactionState::Done => {
            next.acquirer_reference = notification.get(fields::TXN_ID).map(str::to_string);
            next.alipay_txn_type = notification.get(fields::PAYMENT_TYPE).map(str::to_string);
            next.partner_reference = notification.get(fields::PAYER_ID).map(str::to_string);
            next.state_message = None;
            next.date_validated = Some(
                notification
                    .non_empty(fields::PAYMENT_DATE)
                    .and_then(|raw| {
                        let parsed = parse_payment_date(raw);
                        if parsed.is_none() {
                            tracing::warn!(reference = %tx.reference, payment_date = raw, "Unparseable payment_date, using current time");
                        }
                        parsed
                    })
                    .unwrap_or(now),
            );
            tracing::info!(
                reference = %next.reference,
                state = %next.state,
                txn_id = next.acquirer_reference.as_deref().unwrap_or(""),
                "Validated Alipay payment for tx {}: set as done",
                next.reference
            );
        }
        TransactionState::Pending => {
            next.state_message = Some(
                notification
                    .get(fields::PENDING_REASON)
                    .unwrap_or_default()
                    .to_string(),
            );
            tracing::info!(
                reference = %next.reference,
                state = %next.state,
                "Received notification for Alipay payment {}: set as pending",
                next.reference
            );
        }
        _ => {
            let error = format!(
                "Received unrecognized status for Alipay payment {}: {}, set as error",
                tx.reference,
                status.unwrap_or("None")
            );
            tracing::info!(reference = %next.reference, state = %next.state, "{error}");
            next.state_message = Some(error);
        }
    }

    Ok(Transition::Applied(next))
}

/// Parses `payment_date` as RFC 3339, or as `YYYY-MM-DD HH:MM:SS` in gateway-local time.
pub fn parse_payment_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok()?;
    FixedOffset::east_opt(GATEWAY_UTC_OFFSET_SECS)?
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}
