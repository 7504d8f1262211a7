use crate::{
    errors::ServiceError,
    handlers::common::{parse_date, text_download, ApiPath},
    services::{documents, reports::DayDetail},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::State,
    response::{Json, Response},
    routing::get,
    Router,
};

pub fn reports_routes() -> Router<AppState> {
    Router::new()
        .route("/:date", get(view_day))
        .route("/:date/export", get(export_day))
}

/// Grouped detail of a stored day, open or closed.
#[utoipa::path(
    get,
    path = "/api/v1/unloading/days/{date}",
    params(("date" = String, Path, description = "YYYY-MM-DD")),
    responses(
        (status = 200, description = "Events grouped by company", body = DayDetail),
        (status = 400, description = "Unparseable date", body = crate::errors::ErrorResponse),
        (status = 404, description = "No ledger for the date", body = crate::errors::ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn view_day(
    State(state): State<AppState>,
    ApiPath(date): ApiPath<String>,
) -> ApiResult<DayDetail> {
    let date = parse_date(&date)?;
    let detail = state.services.reports.view_day(date).await?;
    Ok(Json(ApiResponse::success(detail)))
}

#[utoipa::path(
    get,
    path = "/api/v1/unloading/days/{date}/export",
    params(("date" = String, Path, description = "YYYY-MM-DD")),
    responses(
        (status = 200, description = "Printable day summary", content_type = "text/plain"),
        (status = 404, description = "No ledger for the date", body = crate::errors::ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn export_day(
    State(state): State<AppState>,
    ApiPath(date): ApiPath<String>,
) -> Result<Response, ServiceError> {
    let date = parse_date(&date)?;
    let detail = state.services.reports.view_day(date).await?;
    let body = documents::render_day_summary(&state.config.receipt_issuer, &detail);
    Ok(text_download(&documents::day_filename(date), body))
}
