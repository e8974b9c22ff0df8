//! # Alipay Hex
//!
//! Application service layer and HTTP adapter for the Alipay integration.
//!
//! ## Architecture
//!
//! - `redirect/` - Outbound request builder for the hosted-payment page
//! - `reconcile/` - Notification matcher, field validator, state machine
//! - `service/` - Application service (orchestrates the above over the ports)
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! The service is generic over `R: GatewayRepository`, allowing
//! different repository implementations to be injected.

pub mod inbound;
pub mod reconcile;
pub mod redirect;
pub mod service;


pub use service::{GatewayService, GatewaySettings, NOTIFY_PATH, RETURN_PATH};
