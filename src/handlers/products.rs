use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
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
    entities::product,
    errors::ApiError,
    services::products::{ProductInput, ProductListParams},
    AppState,
};

fn validate_price_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("unit_price_not_positive"));
    }
    Ok(())
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    10
}

/// Query parameters for product listings
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    /// Page number (1-based)
    #[serde(default = "default_page")]
    pub page: u64,
    /// Page size
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Case-insensitive substring match over description and stock code
    pub search: Option<String>,
    /// Sort column; unknown values fall back to product_id
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default asc)
    pub sort_order: Option<String>,
    /// Filter by category
    pub category_id: Option<i32>,
    /// Filter by active flag; absent means no filter
    pub is_active: Option<bool>,
}

/// Write payload shared by create and full-row replace. On replace, absent
/// optional fields become NULL and absent defaults take their schema values.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ProductWriteRequest {
    #[validate(length(
        min = 1,
        max = 20,
        message = "stock_code must be between 1 and 20 characters"
    ))]
    pub stock_code: String,

    pub description: Option<String>,

    pub category_id: Option<i32>,

    #[validate(custom = "validate_price_positive")]
    pub unit_price: Decimal,

    #[validate(range(min = 0, message = "stock_quantity cannot be negative"))]
    pub stock_quantity: Option<i32>,

    #[validate(range(min = 0, message = "reorder_level cannot be negative"))]
    pub reorder_level: Option<i32>,

    pub supplier_info: Option<String>,

    pub is_active: Option<bool>,

    pub weight: Option<Decimal>,

    pub dimensions: Option<String>,
}

impl ProductWriteRequest {
    fn into_input(self) -> Result<ProductInput, ApiError> {
        let stock_code = normalize_string(self.stock_code);
        if stock_code.is_empty() {
            return Err(ApiError::ValidationError(
                "stock_code cannot be blank".to_string(),
            ));
        }

        Ok(ProductInput {
            stock_code,
            description: normalize_optional_string(self.description),
            category_id: self.category_id,
            unit_price: self.unit_price,
            stock_quantity: self.stock_quantity.unwrap_or(0),
            reorder_level: self.reorder_level.unwrap_or(10),
            supplier_info: normalize_optional_string(self.supplier_info),
            is_active: self.is_active.unwrap_or(true),
            weight: self.weight,
            dimensions: normalize_optional_string(self.dimensions),
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub product_id: i64,
    pub stock_code: String,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    pub unit_price: Decimal,
    pub stock_quantity: i32,
    pub reorder_level: i32,
    pub supplier_info: Option<String>,
    pub is_active: bool,
    pub weight: Option<Decimal>,
    pub dimensions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<product::Model> for ProductResponse {
    fn from(model: product::Model) -> Self {
        Self {
            product_id: model.product_id,
            stock_code: model.stock_code,
            description: model.description,
            category_id: model.category_id,
            unit_price: model.unit_price,
            stock_quantity: model.stock_quantity,
            reorder_level: model.reorder_level,
            supplier_info: model.supplier_info,
            is_active: model.is_active,
            weight: model.weight,
            dimensions: model.dimensions,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// List products
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Paginated product list", body = crate::ApiResponse<crate::PaginatedResponse<ProductResponse>>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let params = ProductListParams {
        page: query.page,
        limit: query.limit,
        search: query.search,
        sort_by: query.sort_by,
        sort_order: query.sort_order,
        category_id: query.category_id,
        is_active: query.is_active,
    };

    let page = state
        .services
        .products
        .list_products(params)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(page.map_items(ProductResponse::from)))
}

/// Get a product by surrogate or business key
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(
        ("id" = String, Path, description = "Numeric product_id or alphanumeric stock_code")
    ),
    responses(
        (status = 200, description = "Product retrieved", body = crate::ApiResponse<ProductResponse>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(ident): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .products
        .get_product(&ident)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductResponse::from(product)))
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = ProductWriteRequest,
    responses(
        (status = 201, description = "Product created", body = crate::ApiResponse<ProductResponse>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate stock_code", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<ProductWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let input = payload.into_input()?;

    let product = state
        .services
        .products
        .create_product(input)
        .await
        .map_err(map_service_error)?;

    info!(product_id = product.product_id, "Product created");

    Ok(created_response(ProductResponse::from(product)))
}

/// Replace a product (full-row write)
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(
        ("id" = String, Path, description = "Numeric product_id or alphanumeric stock_code")
    ),
    request_body = ProductWriteRequest,
    responses(
        (status = 200, description = "Product replaced", body = crate::ApiResponse<ProductResponse>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn replace_product(
    State(state): State<AppState>,
    Path(ident): Path<String>,
    Json(payload): Json<ProductWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let input = payload.into_input()?;

    let product = state
        .services
        .products
        .replace_product(&ident, input)
        .await
        .map_err(map_service_error)?;

    info!(product_id = product.product_id, "Product replaced");

    Ok(success_response(ProductResponse::from(product)))
}

/// Delete a product; blocked while transaction rows reference it
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(
        ("id" = String, Path, description = "Numeric product_id or alphanumeric stock_code")
    ),
    responses(
        (status = 200, description = "Deleted product returned", body = crate::ApiResponse<ProductResponse>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Dependent rows exist", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(ident): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .products
        .delete_product(&ident)
        .await
        .map_err(map_service_error)?;

    info!(product_id = product.product_id, "Product deleted");

    Ok(success_response(ProductResponse::from(product)))
}

/// Creates the router for product endpoints
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/", post(create_product))
        .route("/:id", get(get_product))
        .route("/:id", put(replace_product))
        .route("/:id", delete(delete_product))
}
