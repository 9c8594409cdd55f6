//! HTTP surface over a single in-memory [`Ledger`].

pub mod constants;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use powchain_core::{
    auth::SignedTransaction,
    error::{AdmissionError, AuthError, MineError},
    Block, Ledger, Payload,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Shared handle to the node's ledger. All mutation goes through the write lock,
/// so at most one request mines or enqueues at a time.
#[derive(Clone)]
pub struct AppState {
    ledger: Arc<RwLock<Ledger>>,
}

impl AppState {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
        }
    }

    pub fn ledger(&self) -> &Arc<RwLock<Ledger>> {
        &self.ledger
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Serialize)]
struct ChainView {
    length: usize,
    chain: Vec<Block>,
}

#[derive(Serialize)]
struct VerifyView {
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<String>>,
}

#[derive(Serialize)]
struct Accepted {
    accepted: bool,
    pending: usize,
}

#[derive(Serialize)]
struct MineView {
    mined: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<u64>,
}

#[derive(Debug)]
pub enum ApiError {
    Admission(AdmissionError),
    Mining(MineError),
    Internal(String),
}

impl From<AdmissionError> for ApiError {
    fn from(err: AdmissionError) -> Self {
        ApiError::Admission(err)
    }
}

impl From<MineError> for ApiError {
    fn from(err: MineError) -> Self {
        ApiError::Mining(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Admission(err) => {
                let status = match err {
                    AdmissionError::SignatureRequired
                    | AdmissionError::Auth(AuthError::BadSignature) => StatusCode::FORBIDDEN,
                    AdmissionError::Auth(_) => StatusCode::BAD_REQUEST,
                };
                (status, Json(json!({ "accepted": false, "error": err.to_string() })))
                    .into_response()
            }
            ApiError::Mining(err) => (
                StatusCode::CONFLICT,
                Json(json!({ "mined": false, "error": err.to_string() })),
            )
                .into_response(),
            ApiError::Internal(msg) => {
                error!(%msg, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": msg })),
                )
                    .into_response()
            }
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/transactions", get(list_pending).post(submit_transaction))
        .route("/transactions/signed", post(submit_signed_transaction))
        .route("/chain", get(get_chain))
        .route("/verify", get(verify_chain))
        .route("/mine", post(mine))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// GET /transactions
async fn list_pending(State(state): State<AppState>) -> Json<Vec<Payload>> {
    Json(state.ledger.read().await.pending().to_vec())
}

/// GET /chain
async fn get_chain(State(state): State<AppState>) -> Json<ChainView> {
    let ledger = state.ledger.read().await;
    Json(ChainView {
        length: ledger.size(),
        chain: ledger.blocks().to_vec(),
    })
}

/// GET /verify
async fn verify_chain(State(state): State<AppState>) -> Json<VerifyView> {
    let (ok, details) = state.ledger.read().await.verify().into_parts();
    let view = if ok {
        VerifyView {
            message: "The Blockchain is valid",
            details: None,
        }
    } else {
        VerifyView {
            message: "The Blockchain is not valid",
            details: Some(details),
        }
    };
    Json(view)
}

/// POST /transactions
async fn submit_transaction(
    State(state): State<AppState>,
    Json(tx): Json<Payload>,
) -> Result<(StatusCode, Json<Accepted>), ApiError> {
    let mut ledger = state.ledger.write().await;
    ledger.add_transaction(tx)?;
    Ok((
        StatusCode::CREATED,
        Json(Accepted {
            accepted: true,
            pending: ledger.pending().len(),
        }),
    ))
}

/// POST /transactions/signed
async fn submit_signed_transaction(
    State(state): State<AppState>,
    Json(tx): Json<SignedTransaction>,
) -> Result<(StatusCode, Json<Accepted>), ApiError> {
    let mut ledger = state.ledger.write().await;
    ledger.add_signed_transaction(tx)?;
    Ok((
        StatusCode::CREATED,
        Json(Accepted {
            accepted: true,
            pending: ledger.pending().len(),
        }),
    ))
}

/// POST /mine
///
/// Proof of work is CPU bound, so it runs on the blocking pool while holding
/// the write lock for the whole search.
async fn mine(State(state): State<AppState>) -> Result<Json<MineView>, ApiError> {
    let ledger = state.ledger.clone();
    let outcome = tokio::task::spawn_blocking(move || ledger.blocking_write().mine())
        .await
        .map_err(|e| ApiError::Internal(format!("mining task failed: {e}")))?;
    let index = outcome?;
    Ok(Json(MineView {
        mined: index.is_some(),
        index,
    }))
}
