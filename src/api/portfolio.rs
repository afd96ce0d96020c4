use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::ledger::money::{
    cents_to_dollars, dollars_to_cents, micro_to_shares, shares_to_micro,
};
use crate::ledger::{basis, Account, LedgerEngine, LedgerError, TxKind};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<LedgerEngine>,
}

/// Create the API router
pub fn create_router(engine: Arc<LedgerEngine>) -> Router {
    let state = AppState { engine };

    Router::new()
        .route("/health", get(health_check))
        .route("/api/portfolio/:account_id/open", post(open_account))
        .route("/api/portfolio/:account_id/invest", post(invest))
        .route("/api/portfolio/:account_id/sell", post(sell))
        .route("/api/portfolio/:account_id", get(get_portfolio))
        .route("/api/portfolio/:account_id/basis/:symbol", get(get_basis))
        .with_state(state)
}

// ===== Route Handlers =====

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create the account with the starting balance if it does not exist yet
async fn open_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<SnapshotResponse>, ApiError> {
    let account = state.engine.open_account(&account_id).await?;
    Ok(Json(SnapshotResponse::from(&account)))
}

/// Buy: the client computes quantity from the quoted price it showed the user
async fn invest(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Json(body): Json<InvestRequest>,
) -> Result<Json<SnapshotResponse>, ApiError> {
    let account = state
        .engine
        .buy(
            &account_id,
            &body.symbol,
            dollars_to_cents(body.amount_invested),
            shares_to_micro(body.quantity),
        )
        .await?;
    Ok(Json(SnapshotResponse::from(&account)))
}

/// Sell at the oracle's current price
async fn sell(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Json(body): Json<SellRequest>,
) -> Result<Json<SnapshotResponse>, ApiError> {
    let account = state
        .engine
        .sell(&account_id, &body.symbol, shares_to_micro(body.quantity))
        .await?;
    Ok(Json(SnapshotResponse::from(&account)))
}

/// Read-only portfolio snapshot
async fn get_portfolio(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<SnapshotResponse>, ApiError> {
    let account = state.engine.snapshot(&account_id).await?;
    Ok(Json(SnapshotResponse::from(&account)))
}

/// Average cost per currently-held share, derived from the transaction log
async fn get_basis(
    State(state): State<AppState>,
    Path((account_id, symbol)): Path<(String, String)>,
) -> Result<Json<BasisResponse>, ApiError> {
    let account = state.engine.snapshot(&account_id).await?;
    let average_price =
        basis::average_price(&account.transactions, &symbol).map(cents_to_dollars);
    Ok(Json(BasisResponse {
        symbol,
        average_price,
    }))
}

// ===== Request/Response Types =====

#[derive(Deserialize)]
struct InvestRequest {
    symbol: String,
    /// Dollars spent on this buy
    amount_invested: f64,
    /// Shares acquired, as computed by the caller from the quoted price
    quantity: f64,
}

#[derive(Deserialize)]
struct SellRequest {
    symbol: String,
    quantity: f64,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct PositionView {
    symbol: String,
    quantity: f64,
    amount_invested: f64,
    last_action: TxKind,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct TransactionView {
    kind: TxKind,
    symbol: String,
    amount: f64,
    quantity: f64,
    at: DateTime<Utc>,
}

#[derive(Serialize)]
struct SnapshotResponse {
    account_id: String,
    balance: f64,
    positions: Vec<PositionView>,
    transactions: Vec<TransactionView>,
}

#[derive(Serialize)]
struct BasisResponse {
    symbol: String,
    /// Dollars per share; null when nothing is currently held
    average_price: Option<f64>,
}

impl From<&Account> for SnapshotResponse {
    fn from(account: &Account) -> Self {
        let mut positions: Vec<PositionView> = account
            .positions
            .values()
            .map(|p| PositionView {
                symbol: p.symbol.clone(),
                quantity: micro_to_shares(p.quantity),
                amount_invested: cents_to_dollars(p.amount_invested),
                last_action: p.last_action,
                updated_at: p.updated_at,
            })
            .collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        Self {
            account_id: account.account_id.clone(),
            balance: cents_to_dollars(account.balance),
            positions,
            transactions: account
                .transactions
                .iter()
                .map(|tx| TransactionView {
                    kind: tx.kind,
                    symbol: tx.symbol.clone(),
                    amount: cents_to_dollars(tx.amount),
                    quantity: micro_to_shares(tx.quantity),
                    at: tx.at,
                })
                .collect(),
        }
    }
}

// ===== Error Handling =====

#[derive(Debug)]
struct ApiError(LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            LedgerError::AccountNotFound => (StatusCode::NOT_FOUND, self.0.to_string()),
            LedgerError::InsufficientFunds
            | LedgerError::InsufficientShares
            | LedgerError::PriceUnavailable
            | LedgerError::InvalidInput(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            LedgerError::Storage(err) => {
                tracing::error!("Storage error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::money::UsdCents;
    use crate::ledger::SqliteLedgerStore;
    use crate::oracle::PriceOracle;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tempfile::NamedTempFile;
    use tower::ServiceExt;

    struct StubOracle {
        price: UsdCents,
    }

    #[async_trait]
    impl PriceOracle for StubOracle {
        async fn price_cents(&self, _symbol: &str) -> anyhow::Result<UsdCents> {
            Ok(self.price)
        }
    }

    fn test_app() -> (Router, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let store =
            Arc::new(SqliteLedgerStore::open(temp_file.path().to_str().unwrap()).unwrap());
        let oracle = Arc::new(StubOracle { price: 150_00 });
        let engine = Arc::new(LedgerEngine::new(store, oracle, 100_000_00));
        (create_router(engine), temp_file)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let (app, _temp) = test_app();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_account_is_not_found() {
        let (app, _temp) = test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/portfolio/ghost")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_open_invest_sell_over_http() {
        let (app, _temp) = test_app();

        let response = app
            .clone()
            .oneshot(post_json("/api/portfolio/alice/open", "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/portfolio/alice/invest",
                r#"{"symbol":"ABC","amount_invested":1000.0,"quantity":10.0}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["balance"], 99_000.0);

        // Stubbed quote is $150: selling 4 credits $600
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/portfolio/alice/sell",
                r#"{"symbol":"ABC","quantity":4.0}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["balance"], 99_600.0);
        assert_eq!(body["positions"][0]["quantity"], 6.0);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/portfolio/alice/basis/ABC")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["average_price"], 100.0);
    }

    #[tokio::test]
    async fn test_insufficient_funds_maps_to_bad_request() {
        let (app, _temp) = test_app();

        app.clone()
            .oneshot(post_json("/api/portfolio/alice/open", "{}"))
            .await
            .unwrap();

        let response = app
            .oneshot(post_json(
                "/api/portfolio/alice/invest",
                r#"{"symbol":"ABC","amount_invested":500000.0,"quantity":10.0}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (LedgerError::AccountNotFound, StatusCode::NOT_FOUND),
            (LedgerError::InsufficientFunds, StatusCode::BAD_REQUEST),
            (LedgerError::InsufficientShares, StatusCode::BAD_REQUEST),
            (LedgerError::PriceUnavailable, StatusCode::BAD_REQUEST),
            (
                LedgerError::invalid("bad"),
                StatusCode::BAD_REQUEST,
            ),
            (
                LedgerError::Storage(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = ApiError(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
