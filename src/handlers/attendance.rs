use crate::{
    handlers::common::{
        now_local, parse_date, today, ApiJson, ApiPath, ApiQuery, DateQuery, Deleted,
    },
    services::attendance::{
        parse_clock, AttendanceOverview, AttendanceView, CheckInInput, CheckInOutcome,
        CheckOutInput, EmployeeInput, EmployeeView,
    },
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::NaiveTime;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

pub fn employee_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_employees).post(create_employee))
        .route(
            "/:id",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
}

pub fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_attendance))
        .route("/:id", axum::routing::delete(delete_attendance))
        .route("/check-in", post(check_in))
        .route("/check-out", post(check_out))
        .route("/overview", get(attendance_overview))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AttendanceRangeQuery {
    /// First work date, inclusive
    pub from: Option<String>,
    /// Last work date, inclusive
    pub to: Option<String>,
}

fn clock_or_now(raw: Option<&str>) -> Result<NaiveTime, crate::errors::ServiceError> {
    match raw.map(str::trim).filter(|t| !t.is_empty()) {
        Some(value) => parse_clock(value),
        None => Ok(now_local().time()),
    }
}

pub async fn list_employees(State(state): State<AppState>) -> ApiResult<Vec<EmployeeView>> {
    let employees = state.services.attendance.list_employees().await?;
    Ok(Json(ApiResponse::success(
        employees.into_iter().map(EmployeeView::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = EmployeeInput,
    responses(
        (status = 201, description = "Employee created", body = EmployeeView),
        (status = 400, description = "Missing or invalid fields", body = crate::errors::ErrorResponse),
        (status = 409, description = "National id already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "attendance"
)]
pub async fn create_employee(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<EmployeeInput>,
) -> Result<(StatusCode, Json<ApiResponse<EmployeeView>>), crate::errors::ServiceError> {
    let employee = state.services.attendance.save_employee(None, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(employee.into())),
    ))
}

pub async fn get_employee(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<EmployeeView> {
    let employee = state.services.attendance.get_employee(id).await?;
    Ok(Json(ApiResponse::success(employee.into())))
}

pub async fn update_employee(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<EmployeeInput>,
) -> ApiResult<EmployeeView> {
    let employee = state
        .services
        .attendance
        .save_employee(Some(id), input)
        .await?;
    Ok(Json(ApiResponse::success(employee.into())))
}

pub async fn delete_employee(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.services.attendance.delete_employee(id).await?;
    Ok(Json(ApiResponse::success(Deleted { id, deleted: true })))
}

#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-in",
    request_body = CheckInInput,
    responses(
        (status = 200, description = "Records created and employees already present", body = CheckInOutcome),
        (status = 400, description = "No employees selected", body = crate::errors::ErrorResponse),
        (status = 422, description = "Unknown or inactive employee", body = crate::errors::ErrorResponse)
    ),
    tag = "attendance"
)]
pub async fn check_in(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CheckInInput>,
) -> ApiResult<CheckInOutcome> {
    let date = input.work_date.unwrap_or_else(today);
    let time = clock_or_now(input.check_in.as_deref())?;
    let outcome = state
        .services
        .attendance
        .check_in(&input.employee_ids, date, time)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-out",
    request_body = CheckOutInput,
    responses(
        (status = 200, description = "Closed record with shift duration", body = AttendanceView),
        (status = 404, description = "Not checked in", body = crate::errors::ErrorResponse),
        (status = 409, description = "Already checked out", body = crate::errors::ErrorResponse)
    ),
    tag = "attendance"
)]
pub async fn check_out(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CheckOutInput>,
) -> ApiResult<AttendanceView> {
    let date = input.work_date.unwrap_or_else(today);
    let time = clock_or_now(input.check_out.as_deref())?;
    let record = state
        .services
        .attendance
        .check_out(input.employee_id, date, time)
        .await?;
    Ok(Json(ApiResponse::success(record)))
}

pub async fn list_attendance(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AttendanceRangeQuery>,
) -> ApiResult<Vec<AttendanceView>> {
    let from = query.from.as_deref().map(parse_date).transpose()?;
    let to = query.to.as_deref().map(parse_date).transpose()?;
    let records = state.services.attendance.list_attendance(from, to).await?;
    Ok(Json(ApiResponse::success(records)))
}

pub async fn delete_attendance(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.services.attendance.delete_attendance(id).await?;
    Ok(Json(ApiResponse::success(Deleted { id, deleted: true })))
}

#[utoipa::path(
    get,
    path = "/api/v1/attendance/overview",
    params(DateQuery),
    responses((status = 200, description = "Head count and pending employees", body = AttendanceOverview)),
    tag = "attendance"
)]
pub async fn attendance_overview(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DateQuery>,
) -> ApiResult<AttendanceOverview> {
    let date = query.resolve()?;
    let overview = state.services.attendance.attendance_overview(date).await?;
    Ok(Json(ApiResponse::success(overview)))
}
