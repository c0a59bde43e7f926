use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, Set, TransactionTrait};
use tracing::{info, instrument};

use crate::{
    db::{DbPool, ListQueryBuilder},
    entities::order_line,
    errors::ServiceError,
    events::{Event, EventSender},
    services::{apply_stock_decrement, ensure_non_negative_line, flatten_transaction_error},
    PaginatedResponse,
};

const SORTABLE_COLUMNS: &[(&str, order_line::Column)] = &[
    ("order_id", order_line::Column::OrderId),
    ("stock_code", order_line::Column::StockCode),
    ("quantity", order_line::Column::Quantity),
    ("unit_price", order_line::Column::UnitPrice),
    ("status", order_line::Column::Status),
    ("created_at", order_line::Column::CreatedAt),
];

#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub stock_code: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub customer_id: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderListParams {
    pub page: u64,
    pub limit: u64,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub status: Option<String>,
}

/// Listing query for order lines; public for contract tests.
pub fn list_query(params: &OrderListParams) -> ListQueryBuilder<order_line::Entity> {
    let mut builder = ListQueryBuilder::new().paginate(params.page, params.limit).sort(
        params.sort_by.as_deref(),
        params.sort_order.as_deref(),
        SORTABLE_COLUMNS,
        order_line::Column::OrderId,
    );

    if let Some(status) = params.status.as_deref() {
        builder = builder.filter(order_line::Column::Status.eq(status));
    }

    builder
}

/// Service for order lines
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        params: OrderListParams,
    ) -> Result<PaginatedResponse<order_line::Model>, ServiceError> {
        list_query(&params)
            .fetch(&self.db)
            .await
            .map_err(|e| ServiceError::from_db(e, "list orders"))
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: i64) -> Result<order_line::Model, ServiceError> {
        order_line::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await
            .map_err(|e| ServiceError::from_db(e, "find order"))?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    /// Inserts an order line and decrements the referenced product's stock
    /// atomically; both are visible together or not at all.
    #[instrument(skip(self, line), fields(stock_code = %line.stock_code, quantity = line.quantity))]
    pub async fn place_order(&self, line: NewOrderLine) -> Result<order_line::Model, ServiceError> {
        ensure_non_negative_line(line.quantity, line.unit_price)?;

        let db = &*self.db;
        let (created, level) = db
            .transaction::<_, (order_line::Model, crate::services::StockLevel), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let created = order_line::ActiveModel {
                            stock_code: Set(line.stock_code),
                            quantity: Set(line.quantity),
                            unit_price: Set(line.unit_price),
                            customer_id: Set(line.customer_id),
                            status: Set("pending".to_string()),
                            created_at: Set(Utc::now()),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await
                        .map_err(|e| ServiceError::from_db(e, "insert order line"))?;

                        let level =
                            apply_stock_decrement(txn, &created.stock_code, created.quantity)
                                .await?;

                        Ok((created, level))
                    })
                },
            )
            .await
            .map_err(flatten_transaction_error)?;

        self.event_sender
            .send_or_log(Event::OrderPlaced {
                order_id: created.order_id,
                stock_code: created.stock_code.clone(),
                quantity: created.quantity,
            })
            .await;

        if level.is_low() {
            self.event_sender
                .send_or_log(Event::LowStockDetected {
                    stock_code: created.stock_code.clone(),
                    available_stock: level.available_stock,
                    reorder_level: level.reorder_level,
                })
                .await;
        }

        info!(
            order_id = created.order_id,
            stock_code = %created.stock_code,
            "Order placed"
        );

        Ok(created)
    }
}
