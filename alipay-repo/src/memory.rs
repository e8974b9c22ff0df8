//! In-memory repository adapter.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use alipay_types::{
    AcquirerConfig, AcquirerId, ConfigStore, RepoError, Transaction, TransactionId,
    TransactionStore,
};

/// A thread-safe in-memory store for transactions and acquirer configurations.
///
/// The version check in `save` runs under the entry's shard lock, so it is
/// as atomic as the SQL adapter's conditional update. References are claimed
/// through `references` the same way, mirroring the unique index.
#[derive(Default)]
pub struct InMemoryRepo {
    transactions: DashMap<TransactionId, Transaction>,
    references: DashMap<String, TransactionId>,
    configs: DashMap<AcquirerId, AcquirerConfig>,
}

impl InMemoryRepo {
    /// Creates a new, empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryRepo {
    async fn find_by_reference(&self, reference: &str) -> Result<Vec<Transaction>, RepoError> {
        let mut found: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|entry| entry.reference == reference)
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by_key(|tx| tx.created_at);
        Ok(found)
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, RepoError> {
        Ok(self.transactions.get(&id).map(|entry| entry.value().clone()))
    }

    async fn create_transaction(&self, tx: Transaction) -> Result<Transaction, RepoError> {
        if self.transactions.contains_key(&tx.id) {
            return Err(RepoError::Conflict(format!("transaction {} exists", tx.id)));
        }
        match self.references.entry(tx.reference.clone()) {
            Entry::Occupied(_) => Err(RepoError::Conflict(format!(
                "Transaction reference {} already exists",
                tx.reference
            ))),
            Entry::Vacant(slot) => {
                self.transactions.insert(tx.id, tx.clone());
                slot.insert(tx.id);
                Ok(tx)
            }
        }
    }

    async fn save(&self, tx: &Transaction) -> Result<Transaction, RepoError> {
        let mut stored = self.transactions.get_mut(&tx.id).ok_or(RepoError::NotFound)?;
        if stored.version != tx.version {
            return Err(RepoError::Conflict(format!(
                "transaction {} was modified concurrently (version {} != {})",
                tx.reference, stored.version, tx.version
            )));
        }
        let mut next = tx.clone();
        next.version = tx.version + 1;
        // reference is immutable once created
        next.reference = stored.reference.clone();
        *stored = next.clone();
        Ok(next)
    }
}

#[async_trait]
impl ConfigStore for InMemoryRepo {
    async fn get_acquirer_config(
        &self,
        id: AcquirerId,
    ) -> Result<Option<AcquirerConfig>, RepoError> {
        Ok(self.configs.get(&id).map(|entry| entry.value().clone()))
    }

    async fn put_acquirer_config(&self, config: AcquirerConfig) -> Result<(), RepoError> {
        self.configs.insert(config.id, config);
        Ok(())
    }
}
