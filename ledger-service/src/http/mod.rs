use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ledger_client::{
    db::record_queries::UnpaidFlat,
    domain::{BillCategory, BuildingLayout, PaymentEvent, PaymentRecord},
};
use serde::{Deserialize, Serialize};

use crate::{
    ledger::{LedgerError, Submission},
    service::{Clock, PaymentLedger, Recorded},
    store::PaymentStore,
};

struct AppState<S> {
    ledger: Arc<PaymentLedger<S>>,
    clock: Clock,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            clock: self.clock,
        }
    }
}

#[derive(Deserialize)]
struct IncomingPayment {
    apartment: String,
    #[serde(default)]
    name: String,
    bill: String,
}

#[derive(Deserialize)]
struct UnpaidQuery {
    bill: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    paid_on: Option<String>,
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let (status, paid_on) = match &self {
            LedgerError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, None),
            LedgerError::Duplicate { paid_on, .. } => (StatusCode::CONFLICT, Some(paid_on.clone())),
            LedgerError::UnverifiableDate { .. } => (StatusCode::CONFLICT, None),
            LedgerError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
        };
        let body = ErrorBody {
            error: self.to_string(),
            paid_on,
        };
        (status, Json(body)).into_response()
    }
}

/// Routes of the payment API.
///
/// - `POST /payments` `{apartment, name, bill}`
/// - `GET /payments`, `GET /payments/events`
/// - `GET /payments/unpaid?bill=maintenance|water`
/// - `GET /building`, `GET /health`
pub fn router<S: PaymentStore + 'static>(ledger: Arc<PaymentLedger<S>>, clock: Clock) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/building", get(building::<S>))
        .route("/payments", post(submit_payment::<S>).get(list_payments::<S>))
        .route("/payments/events", get(list_events::<S>))
        .route("/payments/unpaid", get(list_unpaid::<S>))
        .with_state(AppState { ledger, clock })
}

pub async fn serve(bind_addr: &str, app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid http.bind_addr '{bind_addr}': {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "payment ledger listening");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn building<S: PaymentStore + 'static>(State(state): State<AppState<S>>) -> Json<BuildingLayout> {
    Json(state.ledger.layout().clone())
}

async fn submit_payment<S: PaymentStore + 'static>(
    State(state): State<AppState<S>>,
    Json(payload): Json<IncomingPayment>,
) -> Result<(StatusCode, Json<Recorded>), LedgerError> {
    let submission = Submission::parse(&payload.apartment, &payload.name, &payload.bill, state.clock.today())?;
    let recorded = state.ledger.submit(submission).await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

async fn list_payments<S: PaymentStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<PaymentRecord>>, LedgerError> {
    Ok(Json(state.ledger.records().await?))
}

async fn list_events<S: PaymentStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<PaymentEvent>>, LedgerError> {
    Ok(Json(state.ledger.events().await?))
}

async fn list_unpaid<S: PaymentStore + 'static>(
    State(state): State<AppState<S>>,
    Query(query): Query<UnpaidQuery>,
) -> Result<Json<Vec<UnpaidFlat>>, LedgerError> {
    let category: BillCategory = query
        .bill
        .parse()
        .map_err(|e| LedgerError::Validation(format!("{e}")))?;
    Ok(Json(state.ledger.unpaid_flats(category).await?))
}
