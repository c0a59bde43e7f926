//! End-to-end service tests over an in-memory SQLite database: the
//! transactional stock decrement, the positive-value guard, dependent-row
//! delete blocking, identifier classification and the derived low-stock set.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ConnectOptions, Database};
use tokio::sync::mpsc;

use retail_api::errors::ServiceError;
use retail_api::events::{process_events, EventSender};
use retail_api::handlers::AppServices;
use retail_api::services::products::{ProductInput, ProductListParams};
use retail_api::services::retail::{NewRetailLine, RetailListParams, UpdateRetailLine};
use retail_api::services::orders::NewOrderLine;

async fn test_services() -> AppServices {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.expect("connect");
    retail_api::db::run_migrations(&db).await.expect("migrate");

    let (tx, rx) = mpsc::channel(256);
    tokio::spawn(process_events(rx));

    AppServices::new(Arc::new(db), EventSender::new(tx))
}

fn product_input(stock_code: &str, stock_quantity: i32, reorder_level: i32) -> ProductInput {
    ProductInput {
        stock_code: stock_code.to_string(),
        description: Some(format!("test product {stock_code}")),
        category_id: Some(1),
        unit_price: dec!(9.99),
        stock_quantity,
        reorder_level,
        supplier_info: None,
        is_active: true,
        weight: None,
        dimensions: None,
    }
}

fn retail_line(stock_code: &str, quantity: i32) -> NewRetailLine {
    NewRetailLine {
        invoice_no: "536365".to_string(),
        stock_code: stock_code.to_string(),
        description: None,
        quantity,
        invoice_date: None,
        unit_price: dec!(2.55),
        customer_id: Some(17850),
        country: Some("United Kingdom".to_string()),
    }
}

#[tokio::test]
async fn retail_insert_decrements_stock_and_mirrors_inventory() {
    let services = test_services().await;
    services
        .products
        .create_product(product_input("85123A", 20, 5))
        .await
        .unwrap();

    let line = services
        .retail
        .record_line(retail_line("85123A", 5))
        .await
        .unwrap();
    assert_eq!(line.quantity, 5);

    let product = services.products.get_product("85123A").await.unwrap();
    assert_eq!(product.stock_quantity, 15);

    let level = services.inventory.get_level("85123A").await.unwrap();
    assert_eq!(level.current_stock, 15);
    assert_eq!(level.available_stock, 15);
}

#[tokio::test]
async fn negative_quantity_is_rejected_and_stock_unchanged() {
    let services = test_services().await;
    services
        .products
        .create_product(product_input("85123B", 20, 5))
        .await
        .unwrap();

    let err = services
        .retail
        .record_line(retail_line("85123B", -5))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let product = services.products.get_product("85123B").await.unwrap();
    assert_eq!(product.stock_quantity, 20);

    let page = services
        .retail
        .list_lines(RetailListParams {
            page: 1,
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn zero_quantity_line_is_permitted() {
    let services = test_services().await;
    services
        .products
        .create_product(product_input("ZERO1", 10, 2))
        .await
        .unwrap();

    services
        .retail
        .record_line(retail_line("ZERO1", 0))
        .await
        .unwrap();

    let product = services.products.get_product("ZERO1").await.unwrap();
    assert_eq!(product.stock_quantity, 10);
}

#[tokio::test]
async fn unknown_stock_code_aborts_the_insert() {
    let services = test_services().await;

    let err = services
        .retail
        .record_line(retail_line("NOPE", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ReferentialViolation(_)));

    let page = services
        .retail
        .list_lines(RetailListParams {
            page: 1,
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 0, "no partial insert may be visible");
}

#[tokio::test]
async fn order_insert_shares_the_decrement_flow() {
    let services = test_services().await;
    services
        .products
        .create_product(product_input("ORD01", 12, 10))
        .await
        .unwrap();

    let order = services
        .orders
        .place_order(NewOrderLine {
            stock_code: "ORD01".to_string(),
            quantity: 3,
            unit_price: dec!(4.25),
            customer_id: Some(12583),
        })
        .await
        .unwrap();
    assert_eq!(order.status, "pending");

    let product = services.products.get_product("ORD01").await.unwrap();
    assert_eq!(product.stock_quantity, 9);

    // 9 <= 10: the derived low-stock set must now contain the code
    let alerts = services.inventory.low_stock_alerts().await.unwrap();
    assert!(alerts.iter().any(|a| a.stock_code == "ORD01"));
}

#[tokio::test]
async fn stock_may_go_below_zero_unconditionally() {
    let services = test_services().await;
    services
        .products
        .create_product(product_input("NEG01", 2, 1))
        .await
        .unwrap();

    services
        .retail
        .record_line(retail_line("NEG01", 5))
        .await
        .unwrap();

    let product = services.products.get_product("NEG01").await.unwrap();
    assert_eq!(product.stock_quantity, -3);

    let alerts = services.inventory.low_stock_alerts().await.unwrap();
    assert!(alerts.iter().any(|a| a.stock_code == "NEG01"));
}

#[tokio::test]
async fn concurrent_orders_lose_no_updates() {
    let services = test_services().await;
    services
        .products
        .create_product(product_input("CONC1", 100, 1))
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let orders = services.orders.clone();
        tasks.push(tokio::spawn(async move {
            orders
                .place_order(NewOrderLine {
                    stock_code: "CONC1".to_string(),
                    quantity: 2,
                    unit_price: dec!(1.00),
                    customer_id: None,
                })
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let product = services.products.get_product("CONC1").await.unwrap();
    assert_eq!(product.stock_quantity, 100 - 10 * 2);

    let level = services.inventory.get_level("CONC1").await.unwrap();
    assert_eq!(level.available_stock, 80);
}

#[tokio::test]
async fn duplicate_stock_code_conflicts() {
    let services = test_services().await;
    services
        .products
        .create_product(product_input("DUP01", 1, 1))
        .await
        .unwrap();

    let err = services
        .products
        .create_product(product_input("DUP01", 1, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn delete_is_blocked_while_dependents_exist() {
    let services = test_services().await;
    services
        .products
        .create_product(product_input("DEL01", 20, 5))
        .await
        .unwrap();
    services
        .retail
        .record_line(retail_line("DEL01", 1))
        .await
        .unwrap();

    let err = services.products.delete_product("DEL01").await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    // still there
    assert!(services.products.get_product("DEL01").await.is_ok());
}

#[tokio::test]
async fn delete_without_dependents_returns_the_row() {
    let services = test_services().await;
    services
        .products
        .create_product(product_input("DEL02", 20, 5))
        .await
        .unwrap();

    let deleted = services.products.delete_product("DEL02").await.unwrap();
    assert_eq!(deleted.stock_code, "DEL02");

    let err = services.products.get_product("DEL02").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = services.inventory.get_level("DEL02").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn identifier_classification_picks_the_right_column() {
    let services = test_services().await;
    let created = services
        .products
        .create_product(product_input("ABC123", 5, 1))
        .await
        .unwrap();

    // business key lookup
    let by_code = services.products.get_product("ABC123").await.unwrap();
    assert_eq!(by_code.product_id, created.product_id);

    // surrogate key lookup
    let by_id = services
        .products
        .get_product(&created.product_id.to_string())
        .await
        .unwrap();
    assert_eq!(by_id.stock_code, "ABC123");

    // numeric idents never match stock codes
    let err = services.products.get_product("424242").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn full_row_replace_writes_absent_fields_as_defaults() {
    let services = test_services().await;
    services
        .products
        .create_product(product_input("REP01", 20, 5))
        .await
        .unwrap();

    let replaced = services
        .products
        .replace_product(
            "REP01",
            ProductInput {
                stock_code: "REP01".to_string(),
                description: None,
                category_id: None,
                unit_price: dec!(1.50),
                stock_quantity: 7,
                reorder_level: 10,
                supplier_info: None,
                is_active: true,
                weight: None,
                dimensions: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(replaced.description, None, "absent fields become NULL");
    assert_eq!(replaced.category_id, None);
    assert_eq!(replaced.unit_price, dec!(1.50));
    assert_eq!(replaced.stock_quantity, 7);
}

#[tokio::test]
async fn listing_pagination_and_tri_state_filter() {
    let services = test_services().await;
    for i in 1..=25 {
        services
            .products
            .create_product(product_input(&format!("P{:03}", i), 10, 1))
            .await
            .unwrap();
    }
    let mut inactive = product_input("P900", 10, 1);
    inactive.is_active = false;
    services.products.create_product(inactive).await.unwrap();

    let page = services
        .products
        .list_products(ProductListParams {
            page: 2,
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.items.len(), 10);
    assert_eq!(page.total, 26);
    assert_eq!(page.total_pages, 3);
    assert!(page.has_next);
    assert!(page.has_previous);

    // unknown sort key falls back to product_id ascending, never errors
    let page = services
        .products
        .list_products(ProductListParams {
            page: 1,
            limit: 5,
            sort_by: Some("bogus".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    let ids: Vec<i64> = page.items.iter().map(|p| p.product_id).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);

    // tri-state: absent means no filter, Some(false) selects the inactive row
    let page = services
        .products
        .list_products(ProductListParams {
            page: 1,
            limit: 10,
            is_active: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].stock_code, "P900");

    // zero limit passes through as an empty page
    let page = services
        .products
        .list_products(ProductListParams {
            page: 1,
            limit: 0,
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 26);
    assert_eq!(page.total_pages, 0);
}

#[tokio::test]
async fn retail_line_update_is_guarded_and_leaves_stock_alone() {
    let services = test_services().await;
    services
        .products
        .create_product(product_input("UPD01", 20, 5))
        .await
        .unwrap();
    let line = services
        .retail
        .record_line(retail_line("UPD01", 5))
        .await
        .unwrap();

    let err = services
        .retail
        .update_line(
            line.id,
            UpdateRetailLine {
                quantity: Some(-1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let updated = services
        .retail
        .update_line(
            line.id,
            UpdateRetailLine {
                quantity: Some(2),
                country: Some("France".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.quantity, 2);
    assert_eq!(updated.country.as_deref(), Some("France"));

    // updates never re-run the stock effect
    let product = services.products.get_product("UPD01").await.unwrap();
    assert_eq!(product.stock_quantity, 15);
}

#[tokio::test]
async fn monthly_sales_aggregates_one_calendar_month() {
    let services = test_services().await;
    services
        .products
        .create_product(product_input("SAL01", 100, 1))
        .await
        .unwrap();

    let march = Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap();
    let april = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();

    let mut line = retail_line("SAL01", 5);
    line.unit_price = dec!(2);
    line.invoice_date = Some(march);
    services.retail.record_line(line).await.unwrap();

    // first instant of April belongs to April, not March
    let mut line = retail_line("SAL01", 7);
    line.unit_price = dec!(3);
    line.invoice_date = Some(april);
    services.retail.record_line(line).await.unwrap();

    let total = services.retail.monthly_sales(2025, 3).await.unwrap();
    assert_eq!(total, Decimal::from(10));

    let total = services.retail.monthly_sales(2025, 4).await.unwrap();
    assert_eq!(total, Decimal::from(21));

    // empty month sums to zero
    let total = services.retail.monthly_sales(2025, 5).await.unwrap();
    assert_eq!(total, Decimal::ZERO);

    // month 13 is a validation error, reported before any query
    let err = services.retail.monthly_sales(2025, 13).await.unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}
