use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Retail API",
        version = "1.0.0",
        description = r#"
# Retail API

A REST API over a PostgreSQL retail database: product catalog, retail
transaction feed, order lines and derived inventory alerts.

## Conventions

Successful responses are wrapped as `{ "success": true, "data": ... }`;
failures as `{ "success": false, "error": ..., "message": ... }` with the
HTTP status carrying the error class (400 validation/referential, 404
missing, 409 conflict, 500 opaque database failure).

## Pagination

List endpoints support:
- `page`: Page number (default: 1)
- `limit`: Items per page (default: 10)
- `search`: Case-insensitive substring match
- `sort_by`: Field to sort by (unknown values fall back to the default column)
- `sort_order`: Sort order (asc/desc)

## Stock semantics

Inserting a retail or order line decrements the referenced product's stock
in the same transaction. Quantities and prices must be non-negative; the
decrement itself has no floor.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Retail", description = "Retail transaction endpoints"),
        (name = "Orders", description = "Order line endpoints"),
        (name = "Inventory", description = "Inventory level and alert endpoints")
    ),
    paths(
        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::products::replace_product,
        crate::handlers::products::delete_product,

        // Retail
        crate::handlers::retail::list_retail_lines,
        crate::handlers::retail::get_retail_line,
        crate::handlers::retail::create_retail_line,
        crate::handlers::retail::update_retail_line,
        crate::handlers::retail::monthly_sales,

        // Orders
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::create_order,

        // Inventory
        crate::handlers::inventory::list_inventory,
        crate::handlers::inventory::get_inventory_level,
        crate::handlers::inventory::get_low_stock_items,

        // Status and health intentionally omitted from OpenAPI paths
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,
            crate::ListQuery,

            // Product types
            crate::handlers::products::ProductWriteRequest,
            crate::handlers::products::ProductResponse,

            // Retail types
            crate::handlers::retail::CreateRetailLineRequest,
            crate::handlers::retail::UpdateRetailLineRequest,
            crate::handlers::retail::RetailLineResponse,
            crate::handlers::retail::MonthlySalesResponse,

            // Order types
            crate::handlers::orders::CreateOrderRequest,
            crate::handlers::orders::OrderResponse,

            // Inventory types
            crate::handlers::inventory::InventoryLevelResponse,
            crate::services::inventory::LowStockAlert,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_covers_the_core_surface() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Retail API"));
        assert!(json.contains("/api/v1/products"));
        assert!(json.contains("/api/v1/retail/monthly-sales"));
        assert!(json.contains("/api/v1/inventory/low-stock"));
    }
}
