//! Pins the generated SQL of the listing queries: allow-listed sort with
//! silent fallback, case-insensitive OR-grouped search, AND-ed filters and
//! pass-through pagination.

use retail_api::services::{orders, products, retail};
use retail_api::services::{
    orders::OrderListParams, products::ProductListParams, retail::RetailListParams,
};
use sea_orm::sea_query::{PostgresQueryBuilder, QueryStatementWriter};

fn product_sql(params: &ProductListParams) -> String {
    products::list_query(params)
        .into_query()
        .to_string(PostgresQueryBuilder)
}

fn retail_sql(params: &RetailListParams) -> String {
    retail::list_query(params)
        .into_query()
        .to_string(PostgresQueryBuilder)
}

fn order_sql(params: &OrderListParams) -> String {
    orders::list_query(params)
        .into_query()
        .to_string(PostgresQueryBuilder)
}

fn base_params() -> ProductListParams {
    ProductListParams {
        page: 1,
        limit: 10,
        ..Default::default()
    }
}

#[test]
fn default_listing_sorts_by_surrogate_key_ascending() {
    let sql = product_sql(&base_params());
    assert!(sql.contains(r#""product_id" ASC"#), "{sql}");
    assert!(sql.contains("LIMIT 10"), "{sql}");
    assert!(sql.contains("OFFSET 0"), "{sql}");
}

#[test]
fn unknown_sort_column_silently_falls_back() {
    let params = ProductListParams {
        sort_by: Some("no_such_column".into()),
        ..base_params()
    };
    let sql = product_sql(&params);
    assert!(sql.contains(r#""product_id" ASC"#), "{sql}");
    assert!(!sql.contains("no_such_column"), "{sql}");
}

#[test]
fn sort_identifiers_are_never_spliced_from_input() {
    let params = ProductListParams {
        sort_by: Some("unit_price; DROP TABLE products--".into()),
        sort_order: Some("desc; DROP".into()),
        ..base_params()
    };
    let sql = product_sql(&params);
    assert!(!sql.contains("DROP"), "{sql}");
    // the malicious order string is not "desc", so ascending wins
    assert!(sql.contains(r#""product_id" ASC"#), "{sql}");
}

#[test]
fn allow_listed_sort_and_desc_order_apply() {
    let params = ProductListParams {
        sort_by: Some("unit_price".into()),
        sort_order: Some("DESC".into()),
        ..base_params()
    };
    let sql = product_sql(&params);
    assert!(sql.contains(r#""unit_price" DESC"#), "{sql}");
}

#[test]
fn search_matches_description_and_code_case_insensitively() {
    let params = ProductListParams {
        search: Some("mug".into()),
        ..base_params()
    };
    let sql = product_sql(&params);
    assert!(sql.contains(r#""description" ILIKE '%mug%'"#), "{sql}");
    assert!(sql.contains(r#""stock_code" ILIKE '%mug%'"#), "{sql}");
    assert!(sql.contains(" OR "), "{sql}");
}

#[test]
fn search_values_are_bound_not_concatenated() {
    let params = ProductListParams {
        search: Some("x' OR 1=1--".into()),
        ..base_params()
    };
    let sql = product_sql(&params);
    // the quote arrives escaped inside one string literal
    assert!(sql.contains("ILIKE '%x'' OR 1=1--%'"), "{sql}");
}

#[test]
fn filters_are_and_ed_equality_predicates() {
    let params = ProductListParams {
        category_id: Some(3),
        is_active: Some(true),
        ..base_params()
    };
    let sql = product_sql(&params);
    assert!(sql.contains(r#""category_id" = 3"#), "{sql}");
    assert!(sql.contains(r#""is_active" = TRUE"#), "{sql}");
    assert!(sql.contains(" AND "), "{sql}");
}

#[test]
fn absent_filters_add_no_predicates() {
    let sql = product_sql(&base_params());
    assert!(!sql.contains("category_id\" ="), "{sql}");
    assert!(!sql.contains("is_active\" ="), "{sql}");
    assert!(!sql.contains("ILIKE"), "{sql}");
}

#[test]
fn pagination_is_passed_through_including_zero_limit() {
    let params = ProductListParams {
        page: 3,
        limit: 10,
        ..Default::default()
    };
    let sql = product_sql(&params);
    assert!(sql.contains("LIMIT 10"), "{sql}");
    assert!(sql.contains("OFFSET 20"), "{sql}");

    let params = ProductListParams {
        page: 1,
        limit: 0,
        ..Default::default()
    };
    let sql = product_sql(&params);
    assert!(sql.contains("LIMIT 0"), "{sql}");
}

#[test]
fn retail_listing_defaults_to_invoice_date_and_filters_country() {
    let params = RetailListParams {
        page: 1,
        limit: 10,
        country: Some("France".into()),
        ..Default::default()
    };
    let sql = retail_sql(&params);
    assert!(sql.contains(r#""invoice_date" ASC"#), "{sql}");
    assert!(sql.contains(r#""country" = 'France'"#), "{sql}");
}

#[test]
fn retail_search_covers_invoice_and_stock_code() {
    let params = RetailListParams {
        page: 1,
        limit: 10,
        search: Some("536365".into()),
        ..Default::default()
    };
    let sql = retail_sql(&params);
    assert!(sql.contains(r#""invoice_no" ILIKE '%536365%'"#), "{sql}");
    assert!(sql.contains(r#""stock_code" ILIKE '%536365%'"#), "{sql}");
}

#[test]
fn order_listing_defaults_to_order_id_and_filters_status() {
    let params = OrderListParams {
        page: 2,
        limit: 5,
        status: Some("pending".into()),
        ..Default::default()
    };
    let sql = order_sql(&params);
    assert!(sql.contains(r#""order_id" ASC"#), "{sql}");
    assert!(sql.contains(r#""status" = 'pending'"#), "{sql}");
    assert!(sql.contains("LIMIT 5"), "{sql}");
    assert!(sql.contains("OFFSET 5"), "{sql}");
}
