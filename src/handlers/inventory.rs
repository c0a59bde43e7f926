use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::common::{map_service_error, success_response};
use crate::{entities::inventory_level, errors::ApiError, AppState, ListQuery};

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryLevelResponse {
    pub stock_code: String,
    pub current_stock: i32,
    pub available_stock: i32,
    pub reorder_level: i32,
    pub updated_at: DateTime<Utc>,
}

impl From<inventory_level::Model> for InventoryLevelResponse {
    fn from(model: inventory_level::Model) -> Self {
        Self {
            stock_code: model.stock_code,
            current_stock: model.current_stock,
            available_stock: model.available_stock,
            reorder_level: model.reorder_level,
            updated_at: model.updated_at,
        }
    }
}

/// List inventory levels
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(ListQuery),
    responses(
        (status = 200, description = "Paginated inventory levels", body = crate::ApiResponse<crate::PaginatedResponse<InventoryLevelResponse>>)
    ),
    tag = "Inventory"
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .services
        .inventory
        .list_levels(query.page, query.limit)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(page.map_items(InventoryLevelResponse::from)))
}

/// Current low-stock alerts, derived on read
#[utoipa::path(
    get,
    path = "/api/v1/inventory/low-stock",
    responses(
        (status = 200, description = "Derived alert rows", body = crate::ApiResponse<Vec<crate::services::inventory::LowStockAlert>>)
    ),
    tag = "Inventory"
)]
pub async fn get_low_stock_items(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let alerts = state
        .services
        .inventory
        .low_stock_alerts()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(alerts))
}

/// Get the inventory level for one business key
#[utoipa::path(
    get,
    path = "/api/v1/inventory/{stock_code}",
    params(("stock_code" = String, Path, description = "Product business key")),
    responses(
        (status = 200, description = "Inventory level", body = crate::ApiResponse<InventoryLevelResponse>),
        (status = 404, description = "No inventory row", body = crate::errors::ErrorResponse)
    ),
    tag = "Inventory"
)]
pub async fn get_inventory_level(
    State(state): State<AppState>,
    Path(stock_code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let level = state
        .services
        .inventory
        .get_level(&stock_code)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(InventoryLevelResponse::from(level)))
}

/// Creates the router for inventory endpoints
pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_inventory))
        .route("/low-stock", get(get_low_stock_items))
        .route("/:stock_code", get(get_inventory_level))
}
