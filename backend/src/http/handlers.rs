//! HTTP handlers for the REST API.
//!
//! Each handler resolves its dataset snapshot from the repository and hands
//! the aggregation to the service layer on the blocking pool.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use tracing::{debug, info};

use super::dto::{
    CreateDatasetRequest, DatasetInfo, DatasetListResponse, HealthResponse,
    MarketDeriveResponse, MarketSolveRequest, MarketSolveResponse, PriceHistogramRequest,
    PriceHistogramResponse, SegmentView, SegmentViewRequest, StateMapRequest, StateMapResponse,
    SummariesRequest, SummariesResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::services as db_services;
use crate::models::DatasetId;
use crate::services::segment_view::resolve_fields;
use crate::services::{
    aggregate_by_state, apply_kpi_edit, bucketize, bucketize_by_cluster, derive_all,
    market::profit_maximizing_price, summarize_fields,
};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Unwrap a JSON body, turning extractor rejections into JSON errors.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    let Json(value) = payload?;
    Ok(value)
}

/// Parse the `{dataset_id}` path segment, rejecting it as a JSON error.
fn parse_dataset_id(path: Result<Path<i64>, PathRejection>) -> Result<DatasetId, AppError> {
    let Path(id) = path?;
    Ok(DatasetId::new(id))
}

/// Run CPU-bound aggregation off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let repo_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        repository: repo_status,
    }))
}

// =============================================================================
// Dataset CRUD
// =============================================================================

/// GET /v1/datasets
pub async fn list_datasets(State(state): State<AppState>) -> HandlerResult<DatasetListResponse> {
    let datasets = db_services::list_datasets(state.repository.as_ref()).await?;
    let total = datasets.len();
    Ok(Json(DatasetListResponse { datasets, total }))
}

/// POST /v1/datasets
pub async fn create_dataset(
    State(state): State<AppState>,
    payload: Result<Json<CreateDatasetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DatasetInfo>), AppError> {
    let request = body(payload)?;
    let info = db_services::store_dataset(state.repository.as_ref(), request.into()).await?;
    info!(dataset_id = %info.dataset_id, rows = info.row_count, "dataset uploaded");
    Ok((StatusCode::CREATED, Json(info)))
}

/// DELETE /v1/datasets/{dataset_id}
pub async fn delete_dataset(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> HandlerResult<DatasetInfo> {
    let dataset_id = parse_dataset_id(path)?;
    let info = db_services::delete_dataset(state.repository.as_ref(), dataset_id).await?;
    Ok(Json(info))
}

// =============================================================================
// Segment Panels
// =============================================================================

/// POST /v1/datasets/{dataset_id}/segment-view
pub async fn segment_view(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<SegmentViewRequest>, JsonRejection>,
) -> HandlerResult<SegmentView> {
    let dataset_id = parse_dataset_id(path)?;
    let request = body(payload)?;
    let dataset = db_services::get_dataset(state.repository.as_ref(), dataset_id).await?;
    let views = state.views.clone();

    let view = blocking(move || views.build(&dataset, &request)).await?;
    debug!(dataset_id = %dataset_id, scope = view.scope_sizes.breakdowns, "segment view built");
    Ok(Json(view))
}

/// POST /v1/datasets/{dataset_id}/summaries
pub async fn summaries(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<SummariesRequest>, JsonRejection>,
) -> HandlerResult<SummariesResponse> {
    let dataset_id = parse_dataset_id(path)?;
    let request = body(payload)?;
    let dataset = db_services::get_dataset(state.repository.as_ref(), dataset_id).await?;
    let views = state.views.clone();

    let response = blocking(move || {
        let scope = views.scope(&dataset, &request.filters);
        let fields = resolve_fields(&dataset, &request.fields, request.field_group.as_deref());
        SummariesResponse {
            scope_size: scope.len(),
            sections: summarize_fields(
                &scope,
                &fields,
                &dataset.lookup,
                &dataset.catalog,
                &views.policy,
            ),
        }
    })
    .await?;
    Ok(Json(response))
}

/// POST /v1/datasets/{dataset_id}/price-histogram
pub async fn price_histogram(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<PriceHistogramRequest>, JsonRejection>,
) -> HandlerResult<PriceHistogramResponse> {
    let dataset_id = parse_dataset_id(path)?;
    let request = body(payload)?;
    let dataset = db_services::get_dataset(state.repository.as_ref(), dataset_id).await?;
    let views = state.views.clone();

    let response = blocking(move || {
        let scope = views.scope(&dataset, &request.filters);
        PriceHistogramResponse {
            scope_size: scope.len(),
            histogram: bucketize(scope.iter().copied(), &request.price_field),
            by_cluster: request
                .by_cluster
                .then(|| bucketize_by_cluster(&scope, &request.price_field)),
        }
    })
    .await?;
    Ok(Json(response))
}

/// POST /v1/datasets/{dataset_id}/state-map
pub async fn state_map(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<StateMapRequest>, JsonRejection>,
) -> HandlerResult<StateMapResponse> {
    let dataset_id = parse_dataset_id(path)?;
    let request = body(payload)?;
    let dataset = db_services::get_dataset(state.repository.as_ref(), dataset_id).await?;
    let views = state.views.clone();

    let response = blocking(move || {
        let matcher = views.resolver.matcher(&dataset.lookup);
        let scope = request.filters.without_state(&dataset.rows);
        StateMapResponse {
            scope_size: scope.len(),
            aggregate: aggregate_by_state(scope.iter().copied(), &matcher),
        }
    })
    .await?;
    Ok(Json(response))
}

// =============================================================================
// Market Simulator
// =============================================================================

/// POST /v1/market/derive
pub async fn market_derive(
    payload: Result<Json<crate::services::MarketState>, JsonRejection>,
) -> HandlerResult<MarketDeriveResponse> {
    let state = body(payload)?.clamped();
    Ok(Json(MarketDeriveResponse {
        kpis: derive_all(&state),
        profit_maximizing_price: profit_maximizing_price(&state),
        state,
    }))
}

/// POST /v1/market/solve
pub async fn market_solve(
    payload: Result<Json<MarketSolveRequest>, JsonRejection>,
) -> HandlerResult<MarketSolveResponse> {
    let request = body(payload)?;
    if !request.target.is_finite() {
        return Err(AppError::BadRequest("target must be a finite number".to_string()));
    }
    let solved = apply_kpi_edit(&request.state, request.metric, request.target);
    let kpis = derive_all(&solved);
    Ok(Json(MarketSolveResponse {
        achieved: request.metric.value_of(&kpis),
        state: solved,
        kpis,
    }))
}
