//! SQLite repository adapter.
#![allow(clippy::collapsible_if)]

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use alipay_types::{
    AcquirerConfig, AcquirerId, ConfigStore, RepoError, Transaction, TransactionId,
    TransactionStore,
};

use crate::types::{DbAcquirerConfig, DbTransaction};

const TRANSACTION_COLUMNS: &str = "id, reference, acquirer_id, amount, currency, fees, buyer_email, \
     acquirer_reference, partner_reference, alipay_txn_type, state, state_message, \
     date_validated, created_at, version";

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let in_memory = database_url.contains(":memory:");

        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            // Remove query parameters
            let path = path.split('?').next().unwrap_or(path);
            if !in_memory {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to `:memory:` opens its own database.
        let max_connections = if in_memory { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let repo = Self { pool };
        repo.create_schema().await?;
        Ok(repo)
    }

    /// Creates the database schema.
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        let ddl = include_str!("../migrations/0001_create_tables.sql");
        sqlx::query(ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transaction store
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl TransactionStore for SqliteRepo {
    async fn find_by_reference(&self, reference: &str) -> Result<Vec<Transaction>, RepoError> {
        let rows: Vec<DbTransaction> = sqlx::query_as(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM payment_transactions WHERE reference = ? ORDER BY created_at"
        ))
        .bind(reference)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbTransaction::into_domain).collect()
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, RepoError> {
        let row: Option<DbTransaction> = sqlx::query_as(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM payment_transactions WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbTransaction::into_domain).transpose()
    }

    async fn create_transaction(&self, tx: Transaction) -> Result<Transaction, RepoError> {
        sqlx::query(&format!(
            "INSERT INTO payment_transactions ({TRANSACTION_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(tx.id.to_string())
        .bind(&tx.reference)
        .bind(tx.acquirer_id.to_string())
        .bind(tx.amount.to_string())
        .bind(&tx.currency)
        .bind(tx.fees.to_string())
        .bind(&tx.buyer_email)
        .bind(&tx.acquirer_reference)
        .bind(&tx.partner_reference)
        .bind(&tx.alipay_txn_type)
        .bind(tx.state.as_str())
        .bind(&tx.state_message)
        .bind(tx.date_validated.map(|dt| dt.to_rfc3339()))
        .bind(tx.created_at.to_rfc3339())
        .bind(tx.version)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::Conflict(format!(
                "Transaction reference {} already exists",
                tx.reference
            )),
            e => RepoError::Database(e.to_string()),
        })?;

        Ok(tx)
    }

    async fn save(&self, tx: &Transaction) -> Result<Transaction, RepoError> {
        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        // Reference, amounts and identity are never rewritten.
        let result = sqlx::query(
            r#"UPDATE payment_transactions
               SET acquirer_reference = ?, partner_reference = ?, alipay_txn_type = ?,
                   state = ?, state_message = ?, date_validated = ?, version = version + 1
               WHERE id = ? AND version = ?"#,
        )
        .bind(&tx.acquirer_reference)
        .bind(&tx.partner_reference)
        .bind(&tx.alipay_txn_type)
        .bind(tx.state.as_str())
        .bind(&tx.state_message)
        .bind(tx.date_validated.map(|dt| dt.to_rfc3339()))
        .bind(tx.id.to_string())
        .bind(tx.version)
        .execute(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            let exists: Option<(i64,)> =
                sqlx::query_as(r#"SELECT version FROM payment_transactions WHERE id = ?"#)
                    .bind(tx.id.to_string())
                    .fetch_optional(&mut *db_tx)
                    .await
                    .map_err(|e| RepoError::Database(e.to_string()))?;
            return Err(match exists {
                Some((current,)) => RepoError::Conflict(format!(
                    "transaction {} was modified concurrently (version {} != {})",
                    tx.reference, current, tx.version
                )),
                None => RepoError::NotFound,
            });
        }

        let row: DbTransaction = sqlx::query_as(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM payment_transactions WHERE id = ?"
        ))
        .bind(tx.id.to_string())
        .fetch_one(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        row.into_domain()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Config store
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl ConfigStore for SqliteRepo {
    async fn get_acquirer_config(
        &self,
        id: AcquirerId,
    ) -> Result<Option<AcquirerConfig>, RepoError> {
        let row: Option<DbAcquirerConfig> = sqlx::query_as(
            r#"SELECT id, company_name, alipay_partner_account, alipay_partner_key,
                      alipay_seller_email, environment, fees_active, fees_dom_fixed,
                      fees_dom_var, fees_int_fixed, fees_int_var
               FROM acquirer_configs WHERE id = ?"#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbAcquirerConfig::into_domain).transpose()
    }

    async fn put_acquirer_config(&self, config: AcquirerConfig) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO acquirer_configs
                   (id, company_name, alipay_partner_account, alipay_partner_key,
                    alipay_seller_email, environment, fees_active, fees_dom_fixed,
                    fees_dom_var, fees_int_fixed, fees_int_var)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   company_name = excluded.company_name,
                   alipay_partner_account = excluded.alipay_partner_account,
                   alipay_partner_key = excluded.alipay_partner_key,
                   alipay_seller_email = excluded.alipay_seller_email,
                   environment = excluded.environment,
                   fees_active = excluded.fees_active,
                   fees_dom_fixed = excluded.fees_dom_fixed,
                   fees_dom_var = excluded.fees_dom_var,
                   fees_int_fixed = excluded.fees_int_fixed,
                   fees_int_var = excluded.fees_int_var"#,
        )
        .bind(config.id.to_string())
        .bind(&config.company_name)
        .bind(&config.alipay_partner_account)
        .bind(&config.alipay_partner_key)
        .bind(&config.alipay_seller_email)
        .bind(config.environment.as_str())
        .bind(config.fees.fees_active)
        .bind(config.fees.domestic_fixed.to_string())
        .bind(config.fees.domestic_variable_pct.to_string())
        .bind(config.fees.international_fixed.to_string())
        .bind(config.fees.international_variable_pct.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(())
    }
}
