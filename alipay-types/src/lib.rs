//! # Alipay Types
//!
//! Domain types and port traits for the Alipay gateway integration.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Acquirer configuration, transactions, inbound notifications
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Domain, repository and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    AcquirerConfig, AcquirerId, Discrepancy, Environment, FeeSchedule, Notification, Provider,
    ProviderRegistry, Transaction, TransactionId, TransactionState,
};
pub use dto::*;
pub use error::{AppError, DomainError, RepoError};
pub use ports::{Clock, ConfigStore, GatewayRepository, SystemClock, TransactionStore};
