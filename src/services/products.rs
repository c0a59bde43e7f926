use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set, SqlErr,
    TransactionTrait,
};
use tracing::{info, instrument};

use crate::{
    db::{DbPool, ListQueryBuilder},
    entities::{inventory_level, order_line, product, retail_transaction},
    errors::ServiceError,
    events::{Event, EventSender},
    services::flatten_transaction_error,
    PaginatedResponse,
};

/// Sortable columns for product listings. Anything else falls back to the
/// surrogate key.
const SORTABLE_COLUMNS: &[(&str, product::Column)] = &[
    ("product_id", product::Column::ProductId),
    ("stock_code", product::Column::StockCode),
    ("description", product::Column::Description),
    ("category_id", product::Column::CategoryId),
    ("unit_price", product::Column::UnitPrice),
    ("stock_quantity", product::Column::StockQuantity),
    ("reorder_level", product::Column::ReorderLevel),
    ("created_at", product::Column::CreatedAt),
    ("updated_at", product::Column::UpdatedAt),
];

/// A path identifier, classified: numeric means surrogate key, anything
/// else the business key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductIdent {
    Id(i64),
    Code(String),
}

impl ProductIdent {
    pub fn classify(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(id) => ProductIdent::Id(id),
            Err(_) => ProductIdent::Code(raw.to_string()),
        }
    }
}

impl fmt::Display for ProductIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductIdent::Id(id) => write!(f, "{}", id),
            ProductIdent::Code(code) => write!(f, "{}", code),
        }
    }
}

/// Full set of writable product columns; used by create and by the
/// full-row-replace update.
#[derive(Debug, Clone)]
pub struct ProductInput {
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
}

#[derive(Debug, Clone, Default)]
pub struct ProductListParams {
    pub page: u64,
    pub limit: u64,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub category_id: Option<i32>,
    pub is_active: Option<bool>,
}

/// Builds the listing query for the given parameters. Public so the query
/// contract can be pinned by tests without a database.
pub fn list_query(params: &ProductListParams) -> ListQueryBuilder<product::Entity> {
    let mut builder = ListQueryBuilder::new()
        .paginate(params.page, params.limit)
        .search(
            params.search.as_deref(),
            &[product::Column::Description, product::Column::StockCode],
        )
        .sort(
            params.sort_by.as_deref(),
            params.sort_order.as_deref(),
            SORTABLE_COLUMNS,
            product::Column::ProductId,
        );

    if let Some(category_id) = params.category_id {
        builder = builder.filter(product::Column::CategoryId.eq(category_id));
    }
    if let Some(is_active) = params.is_active {
        builder = builder.filter(product::Column::IsActive.eq(is_active));
    }

    builder
}

/// Service for managing the product catalog
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl ProductService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    async fn find(&self, ident: &ProductIdent) -> Result<Option<product::Model>, ServiceError> {
        let db = &*self.db;
        let found = match ident {
            ProductIdent::Id(id) => product::Entity::find_by_id(*id).one(db).await,
            ProductIdent::Code(code) => {
                product::Entity::find()
                    .filter(product::Column::StockCode.eq(code.as_str()))
                    .one(db)
                    .await
            }
        }
        .map_err(|e| ServiceError::from_db(e, "find product"))?;

        Ok(found)
    }

    /// Looks a product up by surrogate or business key.
    #[instrument(skip(self))]
    pub async fn get_product(&self, ident: &str) -> Result<product::Model, ServiceError> {
        let ident = ProductIdent::classify(ident);
        self.find(&ident)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product '{}' not found", ident)))
    }

    /// Lists products with pagination, filtering and sorting.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        params: ProductListParams,
    ) -> Result<PaginatedResponse<product::Model>, ServiceError> {
        list_query(&params)
            .fetch(&self.db)
            .await
            .map_err(|e| ServiceError::from_db(e, "list products"))
    }

    /// Creates a product together with its inventory mirror row.
    #[instrument(skip(self, input), fields(stock_code = %input.stock_code))]
    pub async fn create_product(&self, input: ProductInput) -> Result<product::Model, ServiceError> {
        let db = &*self.db;

        let existing = product::Entity::find()
            .filter(product::Column::StockCode.eq(input.stock_code.as_str()))
            .one(db)
            .await
            .map_err(|e| ServiceError::from_db(e, "check for existing product"))?;

        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Product with stock_code '{}' already exists",
                input.stock_code
            )));
        }

        let created = db
            .transaction::<_, product::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let created = product::ActiveModel {
                        stock_code: Set(input.stock_code),
                        description: Set(input.description),
                        category_id: Set(input.category_id),
                        unit_price: Set(input.unit_price),
                        stock_quantity: Set(input.stock_quantity),
                        reorder_level: Set(input.reorder_level),
                        supplier_info: Set(input.supplier_info),
                        is_active: Set(input.is_active),
                        weight: Set(input.weight),
                        dimensions: Set(input.dimensions),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(|e| ServiceError::from_db(e, "create product"))?;

                    inventory_level::ActiveModel {
                        stock_code: Set(created.stock_code.clone()),
                        current_stock: Set(created.stock_quantity),
                        available_stock: Set(created.stock_quantity),
                        reorder_level: Set(created.reorder_level),
                        updated_at: Set(chrono::Utc::now()),
                    }
                    .insert(txn)
                    .await
                    .map_err(|e| ServiceError::from_db(e, "create inventory level"))?;

                    Ok(created)
                })
            })
            .await
            .map_err(flatten_transaction_error)?;

        self.event_sender
            .send_or_log(Event::ProductCreated(created.product_id))
            .await;

        info!(
            product_id = created.product_id,
            stock_code = %created.stock_code,
            "Product created"
        );

        Ok(created)
    }

    /// Replaces every mutable column of a product. Absent optional fields
    /// were already resolved to NULL or schema defaults by the caller; this
    /// is a full-row write, not a patch.
    #[instrument(skip(self, input))]
    pub async fn replace_product(
        &self,
        ident: &str,
        input: ProductInput,
    ) -> Result<product::Model, ServiceError> {
        let existing = self.get_product(ident).await?;

        let mut active: product::ActiveModel = existing.into();
        active.stock_code = Set(input.stock_code);
        active.description = Set(input.description);
        active.category_id = Set(input.category_id);
        active.unit_price = Set(input.unit_price);
        active.stock_quantity = Set(input.stock_quantity);
        active.reorder_level = Set(input.reorder_level);
        active.supplier_info = Set(input.supplier_info);
        active.is_active = Set(input.is_active);
        active.weight = Set(input.weight);
        active.dimensions = Set(input.dimensions);

        let updated = active
            .update(&*self.db)
            .await
            .map_err(|e| ServiceError::from_db(e, "replace product"))?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(updated.product_id))
            .await;

        info!(product_id = updated.product_id, "Product replaced");

        Ok(updated)
    }

    /// Deletes a product and its inventory row, returning the deleted row.
    /// Blocked with a conflict while any retail or order line references it.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, ident: &str) -> Result<product::Model, ServiceError> {
        let existing = self.get_product(ident).await?;
        let db = &*self.db;

        let retail_refs = retail_transaction::Entity::find()
            .filter(retail_transaction::Column::StockCode.eq(existing.stock_code.as_str()))
            .count(db)
            .await
            .map_err(|e| ServiceError::from_db(e, "count retail references"))?;

        let order_refs = order_line::Entity::find()
            .filter(order_line::Column::StockCode.eq(existing.stock_code.as_str()))
            .count(db)
            .await
            .map_err(|e| ServiceError::from_db(e, "count order references"))?;

        if retail_refs + order_refs > 0 {
            return Err(ServiceError::Conflict(format!(
                "Product '{}' has {} dependent transaction rows and cannot be deleted",
                existing.stock_code,
                retail_refs + order_refs
            )));
        }

        let stock_code = existing.stock_code.clone();
        let product_id = existing.product_id;

        db.transaction::<_, (), ServiceError>(move |txn| {
            Box::pin(async move {
                inventory_level::Entity::delete_by_id(stock_code)
                    .exec(txn)
                    .await
                    .map_err(|e| ServiceError::from_db(e, "delete inventory level"))?;

                product::Entity::delete_by_id(product_id)
                    .exec(txn)
                    .await
                    // A dependent inserted between the count and the delete
                    // still blocks via the foreign key.
                    .map_err(|e| match e.sql_err() {
                        Some(SqlErr::ForeignKeyConstraintViolation(_)) => ServiceError::Conflict(
                            "Product has dependent transaction rows and cannot be deleted"
                                .to_string(),
                        ),
                        _ => ServiceError::from_db(e, "delete product"),
                    })?;

                Ok(())
            })
        })
        .await
        .map_err(flatten_transaction_error)?;

        self.event_sender
            .send_or_log(Event::ProductDeleted(existing.product_id))
            .await;

        info!(product_id = existing.product_id, "Product deleted");

        Ok(existing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_idents_classify_as_surrogate_keys() {
        assert_eq!(ProductIdent::classify("42"), ProductIdent::Id(42));
        assert_eq!(ProductIdent::classify("-7"), ProductIdent::Id(-7));
    }

    #[test]
    fn non_numeric_idents_classify_as_business_keys() {
        assert_eq!(
            ProductIdent::classify("ABC123"),
            ProductIdent::Code("ABC123".to_string())
        );
        assert_eq!(
            ProductIdent::classify("85123A"),
            ProductIdent::Code("85123A".to_string())
        );
        // Larger than i64 still falls through to the business key
        assert_eq!(
            ProductIdent::classify("99999999999999999999"),
            ProductIdent::Code("99999999999999999999".to_string())
        );
    }
}
