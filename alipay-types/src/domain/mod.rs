//! Domain models for the gateway integration.

pub mod acquirer;
pub mod amount;
pub mod notification;
pub mod provider;
pub mod transaction;

pub use acquirer::{AcquirerConfig, AcquirerId, Environment, FeeSchedule};
pub use notification::{Discrepancy, Notification, REQUIRED_NOTIFY_VERSION, fields};
pub use provider::{Provider, ProviderRegistry};
pub use transaction::{Transaction, TransactionId, TransactionState};
