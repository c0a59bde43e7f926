use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use super::common::{created_response, map_service_error, normalize_string, success_response, validate_input};
use crate::{
    entities::order_line,
    errors::ApiError,
    services::orders::{NewOrderLine, OrderListParams},
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

/// Query parameters for order listings
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Sort column; unknown values fall back to order_id
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default asc)
    pub sort_order: Option<String>,
    /// Equality filter on status
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[validate(length(
        min = 1,
        max = 20,
        message = "stock_code must be between 1 and 20 characters"
    ))]
    pub stock_code: String,

    /// Zero is permitted; negatives are rejected before any query
    #[validate(range(min = 0, message = "quantity cannot be negative"))]
    pub quantity: i32,

    #[validate(custom = "validate_price_non_negative")]
    pub unit_price: Decimal,

    pub customer_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub order_id: i64,
    pub stock_code: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub customer_id: Option<i32>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<order_line::Model> for OrderResponse {
    fn from(model: order_line::Model) -> Self {
        Self {
            order_id: model.order_id,
            stock_code: model.stock_code,
            quantity: model.quantity,
            unit_price: model.unit_price,
            customer_id: model.customer_id,
            status: model.status,
            created_at: model.created_at,
        }
    }
}

/// List order lines
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Paginated order list", body = crate::ApiResponse<crate::PaginatedResponse<OrderResponse>>)
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let params = OrderListParams {
        page: query.page,
        limit: query.limit,
        sort_by: query.sort_by,
        sort_order: query.sort_order,
        status: query.status,
    };

    let page = state
        .services
        .orders
        .list_orders(params)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(page.map_items(OrderResponse::from)))
}

/// Get one order line
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order retrieved", body = crate::ApiResponse<OrderResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .get_order(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(OrderResponse::from(order)))
}

/// Place an order line; decrements product stock atomically
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = crate::ApiResponse<OrderResponse>),
        (status = 400, description = "Invalid payload or unknown stock_code", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let line = NewOrderLine {
        stock_code: normalize_string(payload.stock_code),
        quantity: payload.quantity,
        unit_price: payload.unit_price,
        customer_id: payload.customer_id,
    };

    let created = state
        .services
        .orders
        .place_order(line)
        .await
        .map_err(map_service_error)?;

    info!(order_id = created.order_id, "Order placed");

    Ok(created_response(OrderResponse::from(created)))
}

/// Creates the router for order endpoints
pub fn orders_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/", post(create_order))
        .route("/:id", get(get_order))
}
