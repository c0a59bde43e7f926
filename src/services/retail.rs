use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, instrument};

use crate::{
    db::{DbPool, ListQueryBuilder},
    entities::retail_transaction,
    errors::ServiceError,
    events::{Event, EventSender},
    services::{apply_stock_decrement, ensure_non_negative_line, flatten_transaction_error},
    PaginatedResponse,
};

const SORTABLE_COLUMNS: &[(&str, retail_transaction::Column)] = &[
    ("id", retail_transaction::Column::Id),
    ("invoice_no", retail_transaction::Column::InvoiceNo),
    ("stock_code", retail_transaction::Column::StockCode),
    ("quantity", retail_transaction::Column::Quantity),
    ("unit_price", retail_transaction::Column::UnitPrice),
    ("invoice_date", retail_transaction::Column::InvoiceDate),
    ("country", retail_transaction::Column::Country),
];

#[derive(Debug, Clone)]
pub struct NewRetailLine {
    pub invoice_no: String,
    pub stock_code: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub invoice_date: Option<DateTime<Utc>>,
    pub unit_price: Decimal,
    pub customer_id: Option<i32>,
    pub country: Option<String>,
}

/// Patch for the explicit update endpoint; values stay guarded, stock is
/// not re-adjusted.
#[derive(Debug, Clone, Default)]
pub struct UpdateRetailLine {
    pub invoice_no: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i32>,
    pub invoice_date: Option<DateTime<Utc>>,
    pub unit_price: Option<Decimal>,
    pub customer_id: Option<i32>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RetailListParams {
    pub page: u64,
    pub limit: u64,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub country: Option<String>,
}

/// Listing query for retail transactions; public for contract tests.
pub fn list_query(params: &RetailListParams) -> ListQueryBuilder<retail_transaction::Entity> {
    let mut builder = ListQueryBuilder::new()
        .paginate(params.page, params.limit)
        .search(
            params.search.as_deref(),
            &[
                retail_transaction::Column::InvoiceNo,
                retail_transaction::Column::StockCode,
            ],
        )
        .sort(
            params.sort_by.as_deref(),
            params.sort_order.as_deref(),
            SORTABLE_COLUMNS,
            retail_transaction::Column::InvoiceDate,
        );

    if let Some(country) = params.country.as_deref() {
        builder = builder.filter(retail_transaction::Column::Country.eq(country));
    }

    builder
}

/// Service for the retail transaction feed
#[derive(Clone)]
pub struct RetailService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl RetailService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list_lines(
        &self,
        params: RetailListParams,
    ) -> Result<PaginatedResponse<retail_transaction::Model>, ServiceError> {
        list_query(&params)
            .fetch(&self.db)
            .await
            .map_err(|e| ServiceError::from_db(e, "list retail transactions"))
    }

    #[instrument(skip(self))]
    pub async fn get_line(&self, id: i64) -> Result<retail_transaction::Model, ServiceError> {
        retail_transaction::Entity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(|e| ServiceError::from_db(e, "find retail transaction"))?
            .ok_or_else(|| ServiceError::NotFound(format!("Retail transaction {} not found", id)))
    }

    /// Inserts a transaction line and applies its stock effect in one
    /// transaction. Nothing is visible if any step fails.
    #[instrument(skip(self, line), fields(stock_code = %line.stock_code, quantity = line.quantity))]
    pub async fn record_line(
        &self,
        line: NewRetailLine,
    ) -> Result<retail_transaction::Model, ServiceError> {
        ensure_non_negative_line(line.quantity, line.unit_price)?;

        let db = &*self.db;
        let (created, level) = db
            .transaction::<_, (retail_transaction::Model, crate::services::StockLevel), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let created = retail_transaction::ActiveModel {
                            invoice_no: Set(line.invoice_no),
                            stock_code: Set(line.stock_code),
                            description: Set(line.description),
                            quantity: Set(line.quantity),
                            invoice_date: Set(line.invoice_date.unwrap_or_else(Utc::now)),
                            unit_price: Set(line.unit_price),
                            customer_id: Set(line.customer_id),
                            country: Set(line.country),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await
                        .map_err(|e| ServiceError::from_db(e, "insert retail line"))?;

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
            .send_or_log(Event::RetailLineRecorded {
                id: created.id,
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
            id = created.id,
            stock_code = %created.stock_code,
            "Retail line recorded"
        );

        Ok(created)
    }

    /// Updates a line in place. The positive-value guard applies to the
    /// incoming values; stock effects are insert-only and not re-run.
    #[instrument(skip(self, patch))]
    pub async fn update_line(
        &self,
        id: i64,
        patch: UpdateRetailLine,
    ) -> Result<retail_transaction::Model, ServiceError> {
        if let Some(quantity) = patch.quantity {
            if quantity < 0 {
                return Err(ServiceError::ValidationError(
                    "quantity cannot be negative".to_string(),
                ));
            }
        }
        if let Some(unit_price) = patch.unit_price {
            if unit_price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "unit_price cannot be negative".to_string(),
                ));
            }
        }

        let existing = self.get_line(id).await?;

        let has_changes = patch.invoice_no.is_some()
            || patch.description.is_some()
            || patch.quantity.is_some()
            || patch.invoice_date.is_some()
            || patch.unit_price.is_some()
            || patch.customer_id.is_some()
            || patch.country.is_some();
        if !has_changes {
            return Ok(existing);
        }

        let mut active: retail_transaction::ActiveModel = existing.into();

        if let Some(invoice_no) = patch.invoice_no {
            active.invoice_no = Set(invoice_no);
        }
        if let Some(description) = patch.description {
            active.description = Set(Some(description));
        }
        if let Some(quantity) = patch.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(invoice_date) = patch.invoice_date {
            active.invoice_date = Set(invoice_date);
        }
        if let Some(unit_price) = patch.unit_price {
            active.unit_price = Set(unit_price);
        }
        if let Some(customer_id) = patch.customer_id {
            active.customer_id = Set(Some(customer_id));
        }
        if let Some(country) = patch.country {
            active.country = Set(Some(country));
        }

        active
            .update(&*self.db)
            .await
            .map_err(|e| ServiceError::from_db(e, "update retail line"))
    }

    /// Total sales (`Σ quantity × unit_price`) for one calendar month,
    /// computed over a half-open timestamp range.
    #[instrument(skip(self))]
    pub async fn monthly_sales(&self, year: i32, month: u32) -> Result<Decimal, ServiceError> {
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            ServiceError::ValidationError(format!("invalid year/month: {}-{}", year, month))
        })?;
        let end = if start.month() == 12 {
            NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
        }
        .ok_or_else(|| {
            ServiceError::ValidationError(format!("invalid year/month: {}-{}", year, month))
        })?;

        let start = DateTime::<Utc>::from_naive_utc_and_offset(start.and_time(NaiveTime::MIN), Utc);
        let end = DateTime::<Utc>::from_naive_utc_and_offset(end.and_time(NaiveTime::MIN), Utc);

        let total = retail_transaction::Entity::find()
            .select_only()
            .column_as(
                Expr::expr(
                    Expr::col((
                        retail_transaction::Entity,
                        retail_transaction::Column::Quantity,
                    ))
                    .mul(Expr::col((
                        retail_transaction::Entity,
                        retail_transaction::Column::UnitPrice,
                    ))),
                )
                .sum(),
                "total_sales",
            )
            .filter(retail_transaction::Column::InvoiceDate.gte(start))
            .filter(retail_transaction::Column::InvoiceDate.lt(end))
            .into_tuple::<Option<Decimal>>()
            .one(&*self.db)
            .await
            .map_err(|e| ServiceError::from_db(e, "aggregate monthly sales"))?;

        // SUM over an empty month is NULL, which reads back as zero
        Ok(total.flatten().unwrap_or_default())
    }
}
