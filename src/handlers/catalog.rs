use crate::{
    handlers::common::{ApiJson, ApiPath, ApiQuery, Deleted},
    services::catalog::{
        CompanyCreated, CompanySummary, CreateCompanyInput, CreateProductInput, ProductCreated,
        ProductView,
    },
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/companies", get(search_companies).post(create_company))
        .route("/companies/:id", get(get_company).delete(delete_company))
        .route("/companies/:id/deactivate", post(deactivate_company))
        .route("/products", get(list_products).post(create_product))
        .route("/products/:id", get(get_product))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CompanySearchQuery {
    /// Name fragment, case-insensitive
    pub query: Option<String>,
    pub limit: Option<u64>,
    /// Include deactivated companies when false
    pub active_only: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductListQuery {
    pub active_only: Option<bool>,
}

#[utoipa::path(
    post,
    path = "/api/v1/companies",
    request_body = CreateCompanyInput,
    responses(
        (status = 200, description = "Existing or newly created company", body = CompanyCreated),
        (status = 400, description = "Empty name", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn create_company(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateCompanyInput>,
) -> ApiResult<CompanyCreated> {
    input.validate()?;
    let (company, created) = state
        .services
        .catalog
        .find_or_create_company(&input.name)
        .await?;

    Ok(Json(ApiResponse::success(CompanyCreated {
        id: company.id,
        name: company.name,
        created,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/companies",
    params(CompanySearchQuery),
    responses((status = 200, description = "Companies ordered by name", body = [CompanySummary])),
    tag = "catalog"
)]
pub async fn search_companies(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CompanySearchQuery>,
) -> ApiResult<Vec<CompanySummary>> {
    let companies = state
        .services
        .catalog
        .search_companies(
            query.query.as_deref(),
            query.active_only.unwrap_or(true),
            query.limit,
        )
        .await?;

    Ok(Json(ApiResponse::success(
        companies.into_iter().map(CompanySummary::from).collect(),
    )))
}

pub async fn get_company(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<CompanySummary> {
    let company = state.services.catalog.get_company(id).await?;
    Ok(Json(ApiResponse::success(company.into())))
}

pub async fn deactivate_company(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<CompanySummary> {
    let company = state.services.catalog.deactivate_company(id).await?;
    Ok(Json(ApiResponse::success(company.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/companies/{id}",
    params(("id" = Uuid, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company removed; its events keep no company", body = Deleted),
        (status = 404, description = "Unknown company", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn delete_company(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.services.catalog.delete_company(id).await?;
    Ok(Json(ApiResponse::success(Deleted { id, deleted: true })))
}

#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductInput,
    responses(
        (status = 200, description = "Existing or newly created product", body = ProductCreated),
        (status = 400, description = "Empty name or bad packing", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn create_product(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateProductInput>,
) -> ApiResult<ProductCreated> {
    let (product, created) = state.services.catalog.find_or_create_product(input).await?;

    Ok(Json(ApiResponse::success(ProductCreated {
        full_pallet_units: product.full_pallet_units(),
        id: product.id,
        name: product.name,
        units_per_layer: product.units_per_layer,
        layers_per_pallet: product.layers_per_pallet,
        created,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ProductListQuery),
    responses((status = 200, description = "Products by category and name", body = [ProductView])),
    tag = "catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductListQuery>,
) -> ApiResult<Vec<ProductView>> {
    let products = state
        .services
        .catalog
        .search_products(query.active_only.unwrap_or(true))
        .await?;

    Ok(Json(ApiResponse::success(
        products.into_iter().map(ProductView::from).collect(),
    )))
}

pub async fn get_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ProductView> {
    let product = state.services.catalog.get_product(id).await?;
    Ok(Json(ApiResponse::success(product.into())))
}
