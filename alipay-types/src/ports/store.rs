//! Repository port traits.
//!
//! These are the primary ports in our hexagonal architecture.
//! Adapters (SQLite, InMemory) implement them.

use crate::domain::{AcquirerConfig, AcquirerId, Transaction, TransactionId};
use crate::error::RepoError;

/// Storage for payment transactions.
///
/// `save` is the only write path for an existing transaction and MUST be
/// conditional on the stored version, so that two notifications racing for
/// the same reference cannot both apply.
#[async_trait::async_trait]
pub trait TransactionStore: Send + Sync + 'static {
    /// Returns every transaction carrying `reference`.
    ///
    /// More than one result is a data-integrity problem the caller reports.
    async fn find_by_reference(&self, reference: &str) -> Result<Vec<Transaction>, RepoError>;

    /// Gets a transaction by ID.
    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, RepoError>;

    /// Inserts a transaction created by checkout.
    async fn create_transaction(&self, tx: Transaction) -> Result<Transaction, RepoError>;

    /// Writes `tx` if the stored version still equals `tx.version`.
    ///
    /// Returns the stored transaction with its version bumped, or
    /// `RepoError::Conflict` when another writer got there first.
    async fn save(&self, tx: &Transaction) -> Result<Transaction, RepoError>;
}

/// Read access to acquirer configurations.
#[async_trait::async_trait]
pub trait ConfigStore: Send + Sync + 'static {
    async fn get_acquirer_config(
        &self,
        id: AcquirerId,
    ) -> Result<Option<AcquirerConfig>, RepoError>;

    /// Stores a configuration. Only used to seed the store at startup.
    async fn put_acquirer_config(&self, config: AcquirerConfig) -> Result<(), RepoError>;
}

/// Everything the gateway service needs from persistence.
pub trait GatewayRepository: TransactionStore + ConfigStore {}

impl<T: TransactionStore + ConfigStore> GatewayRepository for T {}
