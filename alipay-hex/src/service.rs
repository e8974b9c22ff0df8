//! Gateway Application Service
//!
//! Orchestrates the redirect builder and the reconciliation pipeline through
//! the repository ports. Contains NO infrastructure logic.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use alipay_types::domain::fields;
use alipay_types::{
    AcquirerConfig, AcquirerId, AppError, Clock, CreateTransactionRequest, GatewayRepository,
    Notification, ProviderInfo, ProviderRegistry, RedirectForm, SystemClock, Transaction,
    TransactionId,
};

use crate::reconcile::{Transition, apply_notification, match_transaction, validate_fields};
use crate::redirect::build_redirect_fields;

/// Path the gateway posts notifications to.
pub const NOTIFY_PATH: &str = "/payment/alipay/notify";
/// Path the buyer's browser comes back to after paying.
pub const RETURN_PATH: &str = "/payment/alipay/return";

/// Settings the service needs beyond what is stored per acquirer.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Public base URL of this service, e.g. `https://shop.example.com`.
    pub base_url: String,
}

impl GatewaySettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn return_url(&self) -> String {
        self.join(RETURN_PATH)
    }

    pub fn notify_url(&self) -> String {
        self.join(NOTIFY_PATH)
    }

    fn join(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Application service for the Alipay integration.
///
/// Generic over `R: GatewayRepository` - the adapter is injected at compile time.
pub struct GatewayService<R: GatewayRepository> {
    repo: R,
    settings: GatewaySettings,
    registry: ProviderRegistry,
    clock: Arc<dyn Clock>,
}

impl<R: GatewayRepository> GatewayService<R> {
    /// Creates a new service with every provider enabled and the wall clock.
    pub fn new(repo: R, settings: GatewaySettings) -> Self {
        Self {
            repo,
            settings,
            registry: ProviderRegistry::with_all(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Lists the providers enabled at startup.
    pub fn providers(&self) -> Vec<ProviderInfo> {
        self.registry
            .list()
            .into_iter()
            .map(|(code, name)| ProviderInfo {
                code: code.to_string(),
                name: name.to_string(),
            })
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Acquirer Configuration
    // ─────────────────────────────────────────────────────────────────────────────

    /// Loads and validates an acquirer configuration.
    pub async fn acquirer_config(&self, id: AcquirerId) -> Result<AcquirerConfig, AppError> {
        let config = self
            .repo
            .get_acquirer_config(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Acquirer {}", id)))?;
        config.validate().inspect_err(|e| {
            tracing::error!(acquirer_id = %id, "Rejecting acquirer configuration: {e}");
        })?;
        Ok(config)
    }

    /// Computes the fees charged for `amount` through this acquirer.
    pub async fn compute_fees(
        &self,
        acquirer_id: AcquirerId,
        amount: Decimal,
        is_domestic: bool,
    ) -> Result<Decimal, AppError> {
        let config = self.acquirer_config(acquirer_id).await?;
        Ok(config.compute_fees(amount, is_domestic)?)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Checkout
    // ─────────────────────────────────────────────────────────────────────────────

    /// Opens a transaction for a checkout, with fees computed from the acquirer schedule.
    #[tracing::instrument(skip(self, req), fields(reference = %req.reference))]
    pub async fn create_transaction(
        &self,
        req: CreateTransactionRequest,
    ) -> Result<Transaction, AppError> {
        if req.currency.trim().len() != 3 {
            return Err(AppError::BadRequest(format!(
                "Invalid currency code '{}'",
                req.currency
            )));
        }

        let fees = self
            .compute_fees(req.acquirer_id, req.amount, req.is_domestic)
            .await?;
        let tx = Transaction::new(
            req.reference,
            req.acquirer_id,
            req.amount,
            req.currency.trim().to_ascii_uppercase(),
            fees,
            req.buyer_email,
        )?;

        // The store claims the reference atomically; a duplicate is a Conflict.
        let tx = self.repo.create_transaction(tx).await?;
        tracing::info!(reference = %tx.reference, state = %tx.state, "Created Alipay transaction");
        Ok(tx)
    }

    /// Gets a transaction by ID.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, AppError> {
        self.repo
            .get_transaction(id)
            .await
            .map_err(Into::into)
            .and_then(|opt| opt.ok_or_else(|| AppError::NotFound(format!("Transaction {}", id))))
    }

    /// Produces the form the checkout page posts to the gateway.
    #[tracing::instrument(skip(self))]
    pub async fn render_redirect_form(&self, id: TransactionId) -> Result<RedirectForm, AppError> {
        let tx = self.get_transaction(id).await?;
        let config = self.acquirer_config(tx.acquirer_id).await?;

        let form_fields = build_redirect_fields(
            &config,
            &tx,
            &tx.buyer_email,
            &self.settings.return_url(),
            &self.settings.notify_url(),
        )?;

        Ok(RedirectForm {
            action_url: config.gateway_url().to_string(),
            fields: form_fields,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Notifications
    // ─────────────────────────────────────────────────────────────────────────────

    /// Runs an inbound notification through match, validate and apply.
    ///
    /// The write is conditional on the version read by the matcher, so a
    /// concurrent notification for the same reference surfaces as
    /// `AppError::Conflict` instead of a double apply. Nothing is retried
    /// here; the gateway resends unacknowledged notifications.
    #[tracing::instrument(
        skip(self, payload),
        fields(
            reference = payload.get(fields::ITEM_NUMBER).map(String::as_str).unwrap_or(""),
            txn_id = payload.get(fields::TXN_ID).map(String::as_str).unwrap_or("")
        )
    )]
    pub async fn handle_notification(
        &self,
        payload: HashMap<String, String>,
    ) -> Result<Transaction, AppError> {
        let notification = Notification::new(payload);

        let tx = match_transaction(&notification, &self.repo).await?;
        let config = self.acquirer_config(tx.acquirer_id).await?;

        let discrepancies = validate_fields(&tx, &config, &notification);
        if !discrepancies.is_empty() {
            tracing::error!(
                reference = %tx.reference,
                state = %tx.state,
                discrepancies = ?discrepancies,
                "Alipay: invalid parameters in notification, transaction left unchanged"
            );
            return Err(AppError::Validation(discrepancies));
        }

        match apply_notification(&tx, &notification, &discrepancies, self.clock.now())? {
            Transition::Applied(next) => {
                let saved = self.repo.save(&next).await.inspect_err(|e| {
                    tracing::error!(reference = %next.reference, "Failed to persist transition: {e}");
                })?;
                Ok(saved)
            }
            Transition::Unchanged(tx) => Ok(tx),
        }
    }
}
