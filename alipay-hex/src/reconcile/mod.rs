//! Notification reconciliation pipeline.
//!
//! An inbound notification runs through three stages, strictly in order:
//! 1. `matcher` - resolve the notification to exactly one transaction
//! 2. `validator` - cross-check the received fields against that transaction
//! 3. `state_machine` - map the payment status to the next transaction state
//!
//! Each stage's failure short-circuits the pipeline. The stages themselves
//! never write; persisting the outcome is the service's job.

pub mod matcher;
pub mod state_machine;
pub mod validator;

pub use matcher::{match_transaction, select_single};
pub use state_machine::{Transition, apply_notification, parse_payment_date};
pub use validator::validate_fields;
