//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to
//! [`ScheduleService`](crate::services::ScheduleService). Extractor rejections are
//! turned into 400 responses with the same error body as service failures.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use super::dto::{
    AutoGenerateOutcome, AutoGenerateRequest, ConflictCheckRequest, ConflictCheckResponse,
    CreateBlockRequest, DeleteBlockResponse, HealthResponse, ListBlocksQuery, Page,
    ScheduleBlock, SlotListResponse, UpdateBlockRequest, WeekdayListResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::models::BlockId;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Result type for handlers that create a resource.
pub type CreatedResult<T> = Result<(StatusCode, Json<T>), AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and storage is accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.schedules.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Schedule Blocks
// =============================================================================

/// GET /v1/schedules
///
/// Paginated block listing filtered by offering and kind, newest first.
pub async fn list_schedules(
    State(state): State<AppState>,
    query: Result<Query<ListBlocksQuery>, QueryRejection>,
) -> HandlerResult<Page<ScheduleBlock>> {
    let Query(query) = query?;
    Ok(Json(state.schedules.list_blocks(&query).await?))
}

/// GET /v1/schedules/{id}
pub async fn get_schedule(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> HandlerResult<ScheduleBlock> {
    let Path(id) = id?;
    Ok(Json(state.schedules.get_block(BlockId::new(id)).await?))
}

/// POST /v1/schedules
///
/// Manual create. Conflicts come back as 400 with the full conflict list.
pub async fn create_schedule(
    State(state): State<AppState>,
    body: Result<Json<CreateBlockRequest>, JsonRejection>,
) -> CreatedResult<ScheduleBlock> {
    let Json(request) = body?;
    let block = state.schedules.create_block(&request).await?;
    Ok((StatusCode::CREATED, Json(block)))
}

/// PATCH /v1/schedules/{id}
///
/// Partial update; a `days` array replaces the whole day/slot hierarchy.
pub async fn update_schedule(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateBlockRequest>, JsonRejection>,
) -> HandlerResult<ScheduleBlock> {
    let Path(id) = id?;
    let Json(request) = body?;
    Ok(Json(
        state
            .schedules
            .update_block(BlockId::new(id), &request)
            .await?,
    ))
}

/// DELETE /v1/schedules/{id}
pub async fn delete_schedule(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> HandlerResult<DeleteBlockResponse> {
    let Path(id) = id?;
    Ok(Json(state.schedules.delete_block(BlockId::new(id)).await?))
}

/// POST /v1/schedules/auto
///
/// Generates and stores a block from credits, weeks and preferred weekdays/slots.
pub async fn auto_generate_schedule(
    State(state): State<AppState>,
    body: Result<Json<AutoGenerateRequest>, JsonRejection>,
) -> CreatedResult<AutoGenerateOutcome> {
    let Json(request) = body?;
    let outcome = state.schedules.auto_generate(&request).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// POST /v1/schedules/conflicts
///
/// Dry-run conflict detection; never writes.
pub async fn check_conflicts(
    State(state): State<AppState>,
    body: Result<Json<ConflictCheckRequest>, JsonRejection>,
) -> HandlerResult<ConflictCheckResponse> {
    let Json(request) = body?;
    Ok(Json(state.schedules.check_conflicts(&request).await?))
}

// =============================================================================
// Catalogs
// =============================================================================

/// GET /v1/slots
pub async fn list_slots(State(state): State<AppState>) -> HandlerResult<SlotListResponse> {
    let slots = state.schedules.list_slots().await?;
    Ok(Json(SlotListResponse { slots }))
}

/// GET /v1/weekdays
pub async fn list_weekdays(State(state): State<AppState>) -> Json<WeekdayListResponse> {
    Json(WeekdayListResponse {
        weekdays: state.schedules.weekdays(),
    })
}
