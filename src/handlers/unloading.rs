use crate::{
    errors::ServiceError,
    handlers::common::{
        now_local, parse_date, text_download, today, ApiJson, ApiPath, ApiQuery, DateQuery,
        Deleted,
    },
    services::{
        day_ledger::{CloseDayInput, DaySummary, LedgerView},
        documents,
        unloading::{EventView, RegisterEventInput},
    },
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub fn unloading_routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(day_summary))
        .route("/events", post(register_event))
        .route("/events/:id", get(get_event).delete(delete_event))
        .route("/events/:id/receipt", get(event_receipt))
        .route("/close", post(close_day))
        .route("/reopen", post(reopen_day))
        .route("/ledgers", get(list_ledgers))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CloseDayResponse {
    pub ok: bool,
    pub ledger_date: NaiveDate,
    pub total_pallets: Decimal,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReopenDayResponse {
    pub ok: bool,
    pub ledger_date: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LedgerListQuery {
    /// Date left out of the list, usually today
    pub exclude: Option<String>,
    pub limit: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/unloading/summary",
    params(DateQuery),
    responses(
        (status = 200, description = "Live state, total and events newest first", body = DaySummary),
        (status = 400, description = "Unparseable date", body = crate::errors::ErrorResponse)
    ),
    tag = "unloading"
)]
pub async fn day_summary(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DateQuery>,
) -> ApiResult<DaySummary> {
    let date = query.resolve()?;
    let summary = state.services.ledgers.day_summary(date).await?;
    Ok(Json(ApiResponse::success(summary)))
}

/// Registers a truck arrival on today's ledger at the current dock time.
#[utoipa::path(
    post,
    path = "/api/v1/unloading/events",
    request_body = RegisterEventInput,
    responses(
        (status = 201, description = "Event with its items", body = EventView),
        (status = 400, description = "Invalid input or no items", body = crate::errors::ErrorResponse),
        (status = 409, description = "Day is closed", body = crate::errors::ErrorResponse),
        (status = 422, description = "Unknown company or product", body = crate::errors::ErrorResponse)
    ),
    tag = "unloading"
)]
pub async fn register_event(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterEventInput>,
) -> Result<(StatusCode, Json<ApiResponse<EventView>>), ServiceError> {
    let view = state
        .services
        .unloading
        .register(today(), now_local(), input)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(view))))
}

#[utoipa::path(
    get,
    path = "/api/v1/unloading/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event with company and items", body = EventView),
        (status = 404, description = "Unknown event", body = crate::errors::ErrorResponse)
    ),
    tag = "unloading"
)]
pub async fn get_event(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<EventView> {
    let view = state.services.unloading.get_event(id).await?;
    Ok(Json(ApiResponse::success(view)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/unloading/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event and items removed", body = Deleted),
        (status = 404, description = "Unknown event", body = crate::errors::ErrorResponse),
        (status = 409, description = "Day is closed", body = crate::errors::ErrorResponse)
    ),
    tag = "unloading"
)]
pub async fn delete_event(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.services.unloading.delete(id).await?;
    Ok(Json(ApiResponse::success(Deleted { id, deleted: true })))
}

#[utoipa::path(
    get,
    path = "/api/v1/unloading/events/{id}/receipt",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Driver receipt", content_type = "text/plain"),
        (status = 404, description = "Unknown event", body = crate::errors::ErrorResponse)
    ),
    tag = "unloading"
)]
pub async fn event_receipt(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, ServiceError> {
    let view = state.services.unloading.get_event(id).await?;
    let body = documents::render_receipt(&state.config.receipt_issuer, &view);
    Ok(text_download(&documents::receipt_filename(&view), body))
}

#[utoipa::path(
    post,
    path = "/api/v1/unloading/close",
    params(DateQuery),
    request_body = CloseDayInput,
    responses(
        (status = 200, description = "Day closed with its frozen total", body = CloseDayResponse),
        (status = 409, description = "Day already closed", body = crate::errors::ErrorResponse)
    ),
    tag = "unloading"
)]
pub async fn close_day(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DateQuery>,
    input: Option<Json<CloseDayInput>>,
) -> ApiResult<CloseDayResponse> {
    let date = query.resolve()?;
    let notes = input.map(|Json(body)| body.notes).unwrap_or_default();
    let ledger = state.services.ledgers.close(date, &notes).await?;

    Ok(Json(
        ApiResponse::success(CloseDayResponse {
            ok: true,
            ledger_date: ledger.ledger_date,
            total_pallets: ledger.total_pallets,
            closed_at: ledger.closed_at,
        })
        .with_message(format!("Day {} closed", date)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/unloading/reopen",
    params(DateQuery),
    responses((status = 200, description = "Day open again", body = ReopenDayResponse)),
    tag = "unloading"
)]
pub async fn reopen_day(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DateQuery>,
) -> ApiResult<ReopenDayResponse> {
    let date = query.resolve()?;
    let ledger = state.services.ledgers.reopen(date).await?;
    Ok(Json(
        ApiResponse::success(ReopenDayResponse {
            ok: true,
            ledger_date: ledger.ledger_date,
        })
        .with_message(format!("Day {} reopened", date)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/unloading/ledgers",
    params(LedgerListQuery),
    responses((status = 200, description = "Recent ledgers, newest first", body = [LedgerView])),
    tag = "unloading"
)]
pub async fn list_ledgers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LedgerListQuery>,
) -> ApiResult<Vec<LedgerView>> {
    let exclude = query.exclude.as_deref().map(parse_date).transpose()?;
    let ledgers = state
        .services
        .ledgers
        .list_ledgers(exclude, query.limit)
        .await?;

    Ok(Json(ApiResponse::success(
        ledgers.into_iter().map(LedgerView::from).collect(),
    )))
}
