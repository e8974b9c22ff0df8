//! # Alipay Repository
//!
//! Store adapters for the gateway integration. This crate provides the
//! in-memory and SQLite implementations of the `TransactionStore` and
//! `ConfigStore` ports.

use async_trait::async_trait;
use alipay_types::{
    AcquirerConfig, AcquirerId, ConfigStore, RepoError, Transaction, TransactionId,
    TransactionStore,
};

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
mod types;


pub use memory::InMemoryRepo;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRepo;

/// URL prefix selecting the in-memory store.
pub const MEMORY_URL: &str = "memory://";

/// Unified repository wrapper over the available store adapters.
pub enum Repo {
    Memory(InMemoryRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteRepo),
}

/// Build and initialize a repository from a database URL.
///
/// ```ignore
/// let repo = build_repo("memory://").await?;
/// let repo = build_repo("sqlite://alipay.db?mode=rwc").await?;
/// ```
pub async fn build_repo(database_url: &str) -> anyhow::Result<Repo> {
    Repo::new(database_url).await
}

impl Repo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        if database_url.starts_with(MEMORY_URL) {
            tracing::info!("using in-memory store");
            return Ok(Self::Memory(InMemoryRepo::new()));
        }

        #[cfg(feature = "sqlite")]
        if database_url.starts_with("sqlite:") {
            tracing::info!("using sqlite store");
            return Ok(Self::Sqlite(SqliteRepo::new(database_url).await?));
        }

        anyhow::bail!("unsupported database url: {database_url}")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Port implementations for Repo (delegation)
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl TransactionStore for Repo {
    async fn find_by_reference(&self, reference: &str) -> Result<Vec<Transaction>, RepoError> {
        match self {
            Self::Memory(repo) => repo.find_by_reference(reference).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(repo) => repo.find_by_reference(reference).await,
        }
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, RepoError> {
        match self {
            Self::Memory(repo) => repo.get_transaction(id).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(repo) => repo.get_transaction(id).await,
        }
    }

    async fn create_transaction(&self, tx: Transaction) -> Result<Transaction, RepoError> {
        match self {
            Self::Memory(repo) => repo.create_transaction(tx).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(repo) => repo.create_transaction(tx).await,
        }
    }

    async fn save(&self, tx: &Transaction) -> Result<Transaction, RepoError> {
        match self {
            Self::Memory(repo) => repo.save(tx).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(repo) => repo.save(tx).await,
        }
    }
}

#[async_trait]
impl ConfigStore for Repo {
    async fn get_acquirer_config(
        &self,
        id: AcquirerId,
    ) -> Result<Option<AcquirerConfig>, RepoError> {
        match self {
            Self::Memory(repo) => repo.get_acquirer_config(id).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(repo) => repo.get_acquirer_config(id).await,
        }
    }

    async fn put_acquirer_config(&self, config: AcquirerConfig) -> Result<(), RepoError> {
        match self {
            Self::Memory(repo) => repo.put_acquirer_config(config).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(repo) => repo.put_acquirer_config(config).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_url_selects_memory_store() {
        assert!(matches!(build_repo("memory://").await.unwrap(), Repo::Memory(_)));
    }

    #[tokio::test]
    async fn test_unknown_scheme_rejected() {
        assert!(build_repo("mysql://localhost/db").await.is_err());
    }
}
