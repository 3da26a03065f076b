use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::geometry::{
    AddressRecord, DisplaySummary, EditorForm, Feature, GeometryReader, Properties, ReadOutcome,
    ResolutionOutcome,
};
use crate::store::{self, RecordId, StoreError};

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

/// Run store/geocoder work off the async runtime.
async fn run_blocking<T, F>(state: Arc<AppState>, work: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppState) -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || work(&state))
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

// ─── GET /api/records/{id}/location ──────────────────────────────

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LocationResponse {
    Summary(DisplaySummary),
    Unsupported { kind: String, message: String },
}

impl LocationResponse {
    /// Map a read outcome onto a response. Corrupt geometry is logged and
    /// shown as a record without marker.
    pub fn from_read(
        reader: &GeometryReader,
        record: RecordId,
        outcome: Result<DisplaySummary, ReadOutcome>,
    ) -> Self {
        match outcome {
            Ok(summary) => Self::Summary(summary),
            Err(ReadOutcome::UnsupportedGeometryKind(kind)) => Self::Unsupported {
                message: format!("{} geometries are managed outside the location editor", kind),
                kind,
            },
            Err(e @ ReadOutcome::CorruptGeometry(_)) => {
                warn!(record, error = %e, "showing record without marker");
                Self::Summary(reader.empty_summary())
            }
        }
    }
}

pub async fn get_location(
    State(state): State<Arc<AppState>>,
    Path(record): Path<RecordId>,
) -> Result<Json<LocationResponse>, ApiError> {
    let response = run_blocking(state, move |state| {
        let outcome = {
            let store = state.lock_store();
            state.reader.summarize_record(&*store, record)
        };
        LocationResponse::from_read(&state.reader, record, outcome)
    })
    .await?;

    Ok(Json(response))
}

// ─── PUT /api/records/{id}/location ──────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    #[serde(flatten)]
    pub form: EditorForm,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveResponse {
    Stored { feature: Feature },
    Unchanged,
    GeocodeNotFound { query: String },
    Cleared,
}

impl SaveResponse {
    /// Only store failures remain errors; every other outcome is a response.
    pub fn from_resolution(
        outcome: Result<Feature, ResolutionOutcome>,
    ) -> Result<Self, StoreError> {
        match outcome {
            Ok(feature) => Ok(Self::Stored { feature }),
            Err(ResolutionOutcome::NoOp) => Ok(Self::Unchanged),
            Err(ResolutionOutcome::GeocodeNotFound { query }) => Ok(Self::GeocodeNotFound { query }),
            Err(ResolutionOutcome::Store(e)) => Err(e),
        }
    }
}

pub async fn put_location(
    State(state): State<Arc<AppState>>,
    Path(record): Path<RecordId>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<SaveResponse>, ApiError> {
    let start = Instant::now();
    let mode = request.form.mode.clone();

    let outcome = run_blocking(state, move |state| {
        let mut store = state.lock_store();
        state
            .resolver
            .resolve_form(&mut *store, record, request.form, request.properties)
    })
    .await?;

    let response = SaveResponse::from_resolution(outcome)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    info!(
        record,
        mode = %mode,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "PUT location"
    );
    Ok(Json(response))
}

// ─── DELETE /api/records/{id}/location ───────────────────────────

pub async fn delete_location(
    State(state): State<Arc<AppState>>,
    Path(record): Path<RecordId>,
) -> Result<Json<SaveResponse>, ApiError> {
    run_blocking(state, move |state| {
        let mut store = state.lock_store();
        state.resolver.clear(&mut *store, record)
    })
    .await?
    .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(SaveResponse::Cleared))
}

// ─── GET /api/records/{id}/address ───────────────────────────────

pub async fn get_address(
    State(state): State<Arc<AppState>>,
    Path(record): Path<RecordId>,
) -> Result<Json<AddressRecord>, ApiError> {
    let address = run_blocking(state, move |state| {
        let store = state.lock_store();
        store::load_address(&*store, record)
    })
    .await?;
    debug!(record, "GET address");
    Ok(Json(address))
}
