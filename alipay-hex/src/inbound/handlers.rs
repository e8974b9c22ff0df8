//! HTTP request handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use alipay_types::{AppError, CreateTransactionRequest, GatewayRepository, TransactionId};

use crate::GatewayService;
use crate::redirect::decode_return_context;

/// Application state shared across handlers.
pub struct AppState<R: GatewayRepository> {
    pub service: GatewayService<R>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Configuration(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// List the providers enabled at startup.
pub async fn list_providers<R: GatewayRepository>(
    State(state): State<Arc<AppState<R>>>,
) -> impl IntoResponse {
    Json(state.service.providers())
}

/// Open a transaction (called by the checkout flow).
#[tracing::instrument(skip(state), fields(reference = %req.reference))]
pub async fn create_transaction<R: GatewayRepository>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tx = state.service.create_transaction(req).await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

/// Redirect form for the hosted-payment page.
#[tracing::instrument(skip(state), fields(transaction_id = %id))]
pub async fn redirect_form<R: GatewayRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let transaction_id: TransactionId = id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid transaction ID".into()))?;

    let form = state.service.render_redirect_form(transaction_id).await?;
    Ok(Json(form))
}

/// Inbound payment notification.
///
/// Any processed outcome, including a transaction set in error, is a plain
/// `200`. Only unmatchable or inconsistent payloads are refused, which makes
/// the gateway resend them.
#[tracing::instrument(skip(state, payload))]
pub async fn notify<R: GatewayRepository>(
    State(state): State<Arc<AppState<R>>>,
    Form(payload): Form<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Beginning Alipay notification processing");
    state.service.handle_notification(payload).await?;
    Ok(StatusCode::OK)
}

/// Buyer coming back from the gateway (query string).
pub async fn payment_return<R: GatewayRepository>(
    State(state): State<Arc<AppState<R>>>,
    Query(params): Query<HashMap<String, String>>,
) -> Redirect {
    Redirect::to(&return_target(&state.service, &params))
}

/// Buyer coming back from the gateway (form post).
pub async fn payment_return_form<R: GatewayRepository>(
    State(state): State<Arc<AppState<R>>>,
    Form(params): Form<HashMap<String, String>>,
) -> Redirect {
    Redirect::to(&return_target(&state.service, &params))
}

/// Picks the echoed return URL, falling back to `/` for anything that is
/// malformed or points outside this site.
fn return_target<R: GatewayRepository>(
    service: &GatewayService<R>,
    params: &HashMap<String, String>,
) -> String {
    let Some(custom) = params.get("custom") else {
        return "/".to_string();
    };
    match decode_return_context(custom) {
        Ok(ctx) if is_local_target(&ctx.return_url, &service.settings().base_url) => {
            ctx.return_url
        }
        Ok(ctx) => {
            tracing::warn!(return_url = %ctx.return_url, "Refusing off-site return URL");
            "/".to_string()
        }
        Err(e) => {
            tracing::warn!("Alipay return without usable context: {e}");
            "/".to_string()
        }
    }
}

fn is_local_target(url: &str, base_url: &str) -> bool {
    let base = base_url.trim_end_matches('/');
    (url.starts_with('/') && !url.starts_with("//"))
        || (!base.is_empty()
            && url
                .strip_prefix(base)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?'])))
}

#[cfg(test)]
mod tests {
    use super::is_local_target;

    #[test]
    fn test_local_targets() {
        let base = "https://shop.example.com/";
        assert!(is_local_target("/shop/confirm", base));
        assert!(is_local_target(
            "https://shop.example.com/payment/alipay/return",
            base
        ));
        assert!(!is_local_target("//evil.example.com", base));
        assert!(!is_local_target("https://shop.example.com.evil.io/", base));
        assert!(!is_local_target("https://evil.example.com/", base));
    }
}
