//! Payment transaction domain model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::acquirer::AcquirerId;
use super::amount::MAX_AMOUNT;
use crate::error::DomainError;

/// Unique identifier for a Transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Creates a new random TransactionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a TransactionId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TransactionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Lifecycle state of a payment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    /// Created by checkout, no notification received yet
    #[default]
    PendingCreation,
    /// Gateway reported the payment as pending or expired
    Pending,
    /// Payment confirmed
    Done,
    /// Gateway reported a status we do not recognize
    Error,
}

impl TransactionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionState::PendingCreation => "pending_creation",
            TransactionState::Pending => "pending",
            TransactionState::Done => "done",
            TransactionState::Error => "error",
        }
    }

    /// Whether a notification may move a transaction from `self` to `next`.
    ///
    /// Nothing returns to `PendingCreation`, and `Done` is final.
    pub fn can_transition_to(&self, next: TransactionState) -> bool {
        match (self, next) {
            (_, TransactionState::PendingCreation) => false,
            (current, _) => !current.is_final(),
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, TransactionState::Done)
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_creation" => Ok(TransactionState::PendingCreation),
            "pending" => Ok(TransactionState::Pending),
            "done" => Ok(TransactionState::Done),
            "error" => Ok(TransactionState::Error),
            other => Err(DomainError::ValidationError(format!(
                "unknown transaction state '{other}'"
            ))),
        }
    }
}

/// A payment transaction reconciled against Alipay notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,
    /// Merchant-side business reference, immutable once created
    pub reference: String,
    /// Acquirer configuration this transaction is paid through
    pub acquirer_id: AcquirerId,
    /// Order amount, excluding fees
    pub amount: Decimal,
    /// ISO 4217 currency code
    pub currency: String,
    /// Fees charged on top of the amount (may be zero)
    pub fees: Decimal,
    /// Buyer email forwarded to the hosted-payment page
    pub buyer_email: String,
    /// Gateway transaction id (`txn_id`), set on confirmation
    pub acquirer_reference: Option<String>,
    /// Gateway buyer id (`payer_id`), set on confirmation
    pub partner_reference: Option<String>,
    /// Gateway payment type, set on confirmation
    pub alipay_txn_type: Option<String>,
    pub state: TransactionState,
    /// Diagnostic for the last transition
    pub state_message: Option<String>,
    /// Set only when the transaction becomes `done`
    pub date_validated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Optimistic-concurrency counter, bumped by every successful save
    pub version: i64,
}

impl Transaction {
    /// Creates a transaction awaiting its first notification.
    pub fn new(
        reference: String,
        acquirer_id: AcquirerId,
        amount: Decimal,
        currency: String,
        fees: Decimal,
        buyer_email: String,
    ) -> Result<Self, DomainError> {
        if reference.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Transaction reference cannot be empty".into(),
            ));
        }
        if amount <= Decimal::ZERO {
            return Err(DomainError::ValidationError(
                "Amount must be positive".into(),
            ));
        }
        if fees < Decimal::ZERO {
            return Err(DomainError::ValidationError(
                "Fees cannot be negative".into(),
            ));
        }
        if amount > MAX_AMOUNT || fees > MAX_AMOUNT {
            return Err(DomainError::ValidationError(format!(
                "Amount and fees cannot exceed {MAX_AMOUNT}"
            )));
        }
        Ok(Self {
            id: TransactionId::new(),
            reference,
            acquirer_id,
            amount,
            currency,
            fees,
            buyer_email,
            acquirer_reference: None,
            partner_reference: None,
            alipay_txn_type: None,
            state: TransactionState::PendingCreation,
            state_message: None,
            date_validated: None,
            created_at: Utc::now(),
            version: 0,
        })
    }

    /// Gross amount the gateway is expected to report (`mc_gross`).
    pub fn expected_gross(&self) -> Decimal {
        self.amount.saturating_add(self.fees)
    }

    pub fn has_fees(&self) -> bool {
        !self.fees.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> Transaction {
        Transaction::new(
            "SO001".into(),
            AcquirerId::new(),
            dec!(100.00),
            "USD".into(),
            dec!(2.50),
            "buyer@example.com".into(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_transaction_awaits_first_notification() {
        let tx = sample();
        assert_eq!(tx.state, TransactionState::PendingCreation);
        assert!(tx.acquirer_reference.is_none());
        assert!(tx.date_validated.is_none());
        assert_eq!(tx.version, 0);
        assert_eq!(tx.expected_gross(), dec!(102.50));
    }

    #[test]
    fn test_empty_reference_fails() {
        let result = Transaction::new(
            " ".into(),
            AcquirerId::new(),
            dec!(1),
            "USD".into(),
            dec!(0),
            String::new(),
        );
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[test]
    fn test_amount_bound() {
        let at_bound = Transaction::new(
            "SO001".into(),
            AcquirerId::new(),
            MAX_AMOUNT,
            "USD".into(),
            MAX_AMOUNT,
            String::new(),
        )
        .unwrap();
        assert_eq!(at_bound.expected_gross(), dec!(2000000000000));

        let result = Transaction::new(
            "SO001".into(),
            AcquirerId::new(),
            dec!(50000000000000000000000000000),
            "USD".into(),
            dec!(0),
            String::new(),
        );
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[test]
    fn test_no_transition_back_to_pending_creation() {
        for state in [
            TransactionState::PendingCreation,
            TransactionState::Pending,
            TransactionState::Done,
            TransactionState::Error,
        ] {
            assert!(!state.can_transition_to(TransactionState::PendingCreation));
        }
    }

    #[test]
    fn test_pending_and_error_are_re_evaluated() {
        assert!(TransactionState::Pending.can_transition_to(TransactionState::Done));
        assert!(TransactionState::Error.can_transition_to(TransactionState::Pending));
        assert!(!TransactionState::Done.can_transition_to(TransactionState::Error));
    }

    #[test]
    fn test_state_round_trips_through_str() {
        let state: TransactionState = "pending_creation".parse().unwrap();
        assert_eq!(state, TransactionState::PendingCreation);
        assert!("voided".parse::<TransactionState>().is_err());
    }
}
