//! Inbound payment notifications (IPN) and the discrepancies found in them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Field names of the gateway notification contract.
pub mod fields {
    pub const ITEM_NUMBER: &str = "item_number";
    pub const TXN_ID: &str = "txn_id";
    pub const NOTIFY_VERSION: &str = "notify_version";
    pub const TEST_IPN: &str = "test_ipn";
    pub const PAYMENT_STATUS: &str = "payment_status";
    pub const MC_GROSS: &str = "mc_gross";
    pub const MC_CURRENCY: &str = "mc_currency";
    pub const HANDLING_AMOUNT: &str = "handling_amount";
    pub const PAYER_ID: &str = "payer_id";
    pub const RECEIVER_EMAIL: &str = "receiver_email";
    pub const RECEIVER_ID: &str = "receiver_id";
    pub const PAYMENT_TYPE: &str = "payment_type";
    pub const PENDING_REASON: &str = "pending_reason";
    pub const PAYMENT_DATE: &str = "payment_date";
}

/// The only notification protocol version we are written against.
pub const REQUIRED_NOTIFY_VERSION: &str = "3.4";

/// A raw notification as posted by the gateway. Untrusted input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Notification(HashMap<String, String>);

impl Notification {
    pub fn new(fields: HashMap<String, String>) -> Self {
        Self(fields)
    }

    /// Raw value of a field, if posted at all.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Value of a field, treating an empty string as absent.
    pub fn non_empty(&self, field: &str) -> Option<&str> {
        self.get(field).filter(|v| !v.is_empty())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn reference(&self) -> Option<&str> {
        self.non_empty(fields::ITEM_NUMBER)
    }

    pub fn txn_id(&self) -> Option<&str> {
        self.non_empty(fields::TXN_ID)
    }

    pub fn payment_status(&self) -> Option<&str> {
        self.get(fields::PAYMENT_STATUS)
    }

    /// True when the notification came from the sandbox (`test_ipn` set).
    pub fn is_sandbox(&self) -> bool {
        self.non_empty(fields::TEST_IPN).is_some()
    }

    pub fn into_inner(self) -> HashMap<String, String> {
        self.0
    }
}

impl From<HashMap<String, String>> for Notification {
    fn from(fields: HashMap<String, String>) -> Self {
        Self(fields)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Notification {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A field whose received value differs from what the transaction expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub field: String,
    /// `None` when the gateway did not send the field
    pub received: Option<String>,
    pub expected: String,
}

impl Discrepancy {
    pub fn new(field: &str, received: Option<&str>, expected: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            received: received.map(str::to_string),
            expected: expected.into(),
        }
    }
}

impl std::fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: received {} instead of {}",
            self.field,
            self.received.as_deref().unwrap_or("None"),
            self.expected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values_are_absent_references() {
        let n: Notification = [(fields::ITEM_NUMBER, ""), (fields::TXN_ID, "T1")]
            .into_iter()
            .collect();
        assert_eq!(n.reference(), None);
        assert_eq!(n.txn_id(), Some("T1"));
        assert!(n.contains(fields::ITEM_NUMBER));
    }

    #[test]
    fn test_sandbox_flag_follows_truthiness() {
        let absent = Notification::default();
        assert!(!absent.is_sandbox());

        let empty: Notification = [(fields::TEST_IPN, "")].into_iter().collect();
        assert!(!empty.is_sandbox());

        let set: Notification = [(fields::TEST_IPN, "1")].into_iter().collect();
        assert!(set.is_sandbox());
    }

    #[test]
    fn test_discrepancy_display() {
        let d = Discrepancy::new(fields::MC_GROSS, Some("99.00"), "100.00");
        assert_eq!(d.to_string(), "mc_gross: received 99.00 instead of 100.00");
    }
}
