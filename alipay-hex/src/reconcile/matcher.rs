//! Resolves a notification to the single transaction it reports on.

use alipay_types::domain::fields;
use alipay_types::{DomainError, Notification, RepoError, Transaction, TransactionStore};

/// Looks up the transaction named by the notification's `item_number`.
///
/// Both `item_number` and `txn_id` must be present and non-empty.
pub async fn match_transaction<S>(
    notification: &Notification,
    store: &S,
) -> Result<Transaction, RepoError>
where
    S: TransactionStore + ?Sized,
{
    let (Some(reference), Some(_)) = (notification.reference(), notification.txn_id()) else {
        let err = DomainError::MissingReference {
            reference: notification.get(fields::ITEM_NUMBER).map(str::to_string),
            txn_id: notification.get(fields::TXN_ID).map(str::to_string),
        };
        tracing::error!("{err}");
        return Err(err.into());
    };

    let candidates = store.find_by_reference(reference).await?;
    select_single(reference, candidates).map_err(|err| {
        tracing::error!(reference, "{err}");
        err.into()
    })
}

/// Accepts exactly one candidate; zero or several is an error, never a guess.
pub fn select_single(
    reference: &str,
    mut candidates: Vec<Transaction>,
) -> Result<Transaction, DomainError> {
    match candidates.len() {
        0 => Err(DomainError::NoMatchingTransaction {
            reference: reference.to_string(),
        }),
        1 => Ok(candidates.remove(0)),
        count => Err(DomainError::AmbiguousReference {
            reference: reference.to_string(),
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alipay_types::AcquirerId;
    use rust_decimal_macros::dec;

    fn tx(reference: &str) -> Transaction {
        Transaction::new(
            reference.into(),
            AcquirerId::new(),
            dec!(10),
            "USD".into(),
            dec!(0),
            String::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_single_candidate_is_returned() {
        let candidate = tx("SO1");
        let matched = select_single("SO1", vec![candidate.clone()]).unwrap();
        assert_eq!(matched, candidate);
    }

    #[test]
    fn test_no_candidate_fails() {
        assert!(matches!(
            select_single("SO1", vec![]),
            Err(DomainError::NoMatchingTransaction { .. })
        ));
    }

    #[test]
    fn test_several_candidates_fail() {
        let result = select_single("SO1", vec![tx("SO1"), tx("SO1"), tx("SO1")]);
        assert!(matches!(
            result,
            Err(DomainError::AmbiguousReference { count: 3, .. })
        ));
    }
}
