use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use super::common::{
    created_response, map_service_error, normalize_optional_string, normalize_string,
    success_response, validate_input,
};
use crate::{
    entities::retail_transaction,
    errors::ApiError,
    services::retail::{NewRetailLine, RetailListParams, UpdateRetailLine},
    AppState,
};

fn validate_price_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("unit_price_negative"));
    }
    Ok(())
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    10
}

/// Query parameters for retail transaction listings
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RetailListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Case-insensitive substring match over invoice and stock code
    pub search: Option<String>,
    /// Sort column; unknown values fall back to invoice_date
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default asc)
    pub sort_order: Option<String>,
    /// Equality filter on country
    pub country: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRetailLineRequest {
    #[validate(length(
        min = 1,
        max = 20,
        message = "invoice_no must be between 1 and 20 characters"
    ))]
    pub invoice_no: String,

    #[validate(length(
        min = 1,
        max = 20,
        message = "stock_code must be between 1 and 20 characters"
    ))]
    pub stock_code: String,

    pub description: Option<String>,

    /// Zero is permitted; negatives are rejected before any query
    #[validate(range(min = 0, message = "quantity cannot be negative"))]
    pub quantity: i32,

    /// Defaults to now when absent
    pub invoice_date: Option<DateTime<Utc>>,

    #[validate(custom = "validate_price_non_negative")]
    pub unit_price: Decimal,

    pub customer_id: Option<i32>,

    pub country: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRetailLineRequest {
    #[validate(length(
        min = 1,
        max = 20,
        message = "invoice_no must be between 1 and 20 characters"
    ))]
    pub invoice_no: Option<String>,

    pub description: Option<String>,

    #[validate(range(min = 0, message = "quantity cannot be negative"))]
    pub quantity: Option<i32>,

    pub invoice_date: Option<DateTime<Utc>>,

    /// Guarded in the service layer: negatives are rejected, zero allowed
    pub unit_price: Option<Decimal>,

    pub customer_id: Option<i32>,

    pub country: Option<String>,
}

/// Query parameters for the monthly sales aggregate
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MonthlySalesQuery {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MonthlySalesResponse {
    pub total_sales: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RetailLineResponse {
    pub id: i64,
    pub invoice_no: String,
    pub stock_code: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub invoice_date: DateTime<Utc>,
    pub unit_price: Decimal,
    pub customer_id: Option<i32>,
    pub country: Option<String>,
}

impl From<retail_transaction::Model> for RetailLineResponse {
    fn from(model: retail_transaction::Model) -> Self {
        Self {
            id: model.id,
            invoice_no: model.invoice_no,
            stock_code: model.stock_code,
            description: model.description,
            quantity: model.quantity,
            invoice_date: model.invoice_date,
            unit_price: model.unit_price,
            customer_id: model.customer_id,
            country: model.country,
        }
    }
}

/// List retail transactions
#[utoipa::path(
    get,
    path = "/api/v1/retail",
    params(RetailListQuery),
    responses(
        (status = 200, description = "Paginated transaction list", body = crate::ApiResponse<crate::PaginatedResponse<RetailLineResponse>>)
    ),
    tag = "Retail"
)]
pub async fn list_retail_lines(
    State(state): State<AppState>,
    Query(query): Query<RetailListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let params = RetailListParams {
        page: query.page,
        limit: query.limit,
        search: query.search,
        sort_by: query.sort_by,
        sort_order: query.sort_order,
        country: query.country,
    };

    let page = state
        .services
        .retail
        .list_lines(params)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(page.map_items(RetailLineResponse::from)))
}

/// Total sales for one calendar month
#[utoipa::path(
    get,
    path = "/api/v1/retail/monthly-sales",
    params(MonthlySalesQuery),
    responses(
        (status = 200, description = "Aggregate computed", body = crate::ApiResponse<MonthlySalesResponse>),
        (status = 400, description = "Invalid year/month", body = crate::errors::ErrorResponse)
    ),
    tag = "Retail"
)]
pub async fn monthly_sales(
    State(state): State<AppState>,
    Query(query): Query<MonthlySalesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let total_sales = state
        .services
        .retail
        .monthly_sales(query.year, query.month)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(MonthlySalesResponse { total_sales }))
}

/// Get one retail transaction
#[utoipa::path(
    get,
    path = "/api/v1/retail/{id}",
    params(("id" = i64, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Transaction retrieved", body = crate::ApiResponse<RetailLineResponse>),
        (status = 404, description = "Transaction not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Retail"
)]
pub async fn get_retail_line(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let line = state
        .services
        .retail
        .get_line(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(RetailLineResponse::from(line)))
}

/// Record a retail transaction line; decrements product stock atomically
#[utoipa::path(
    post,
    path = "/api/v1/retail",
    request_body = CreateRetailLineRequest,
    responses(
        (status = 201, description = "Line recorded", body = crate::ApiResponse<RetailLineResponse>),
        (status = 400, description = "Invalid payload or unknown stock_code", body = crate::errors::ErrorResponse)
    ),
    tag = "Retail"
)]
pub async fn create_retail_line(
    State(state): State<AppState>,
    Json(payload): Json<CreateRetailLineRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let line = NewRetailLine {
        invoice_no: normalize_string(payload.invoice_no),
        stock_code: normalize_string(payload.stock_code),
        description: normalize_optional_string(payload.description),
        quantity: payload.quantity,
        invoice_date: payload.invoice_date,
        unit_price: payload.unit_price,
        customer_id: payload.customer_id,
        country: normalize_optional_string(payload.country),
    };

    let created = state
        .services
        .retail
        .record_line(line)
        .await
        .map_err(map_service_error)?;

    info!(id = created.id, "Retail line recorded");

    Ok(created_response(RetailLineResponse::from(created)))
}

/// Update a retail transaction line (values stay guarded; no stock effect)
#[utoipa::path(
    put,
    path = "/api/v1/retail/{id}",
    params(("id" = i64, Path, description = "Transaction id")),
    request_body = UpdateRetailLineRequest,
    responses(
        (status = 200, description = "Line updated", body = crate::ApiResponse<RetailLineResponse>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Transaction not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Retail"
)]
pub async fn update_retail_line(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRetailLineRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let patch = UpdateRetailLine {
        invoice_no: payload.invoice_no.map(normalize_string),
        description: normalize_optional_string(payload.description),
        quantity: payload.quantity,
        invoice_date: payload.invoice_date,
        unit_price: payload.unit_price,
        customer_id: payload.customer_id,
        country: normalize_optional_string(payload.country),
    };

    let updated = state
        .services
        .retail
        .update_line(id, patch)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(RetailLineResponse::from(updated)))
}

/// Creates the router for retail endpoints
pub fn retail_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_retail_lines))
        .route("/", post(create_retail_line))
        .route("/monthly-sales", get(monthly_sales))
        .route("/:id", get(get_retail_line))
        .route("/:id", put(update_retail_line))
}
