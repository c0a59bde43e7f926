use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use crate::{
    db::{DbPool, ListQueryBuilder},
    entities::inventory_level,
    errors::ServiceError,
    PaginatedResponse,
};

/// A derived low-stock row. Not stored anywhere: re-derived on every read,
/// stamped with the read time.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LowStockAlert {
    pub stock_code: String,
    pub available_stock: i32,
    pub reorder_level: i32,
    pub alert_time: DateTime<Utc>,
}

/// Service for inventory levels and derived alerts
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DbPool>,
}

impl InventoryService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Lists inventory levels ordered by business key.
    #[instrument(skip(self))]
    pub async fn list_levels(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<PaginatedResponse<inventory_level::Model>, ServiceError> {
        ListQueryBuilder::<inventory_level::Entity>::new()
            .paginate(page, limit)
            .sort(None, None, &[], inventory_level::Column::StockCode)
            .fetch(&self.db)
            .await
            .map_err(|e| ServiceError::from_db(e, "list inventory levels"))
    }

    #[instrument(skip(self))]
    pub async fn get_level(
        &self,
        stock_code: &str,
    ) -> Result<inventory_level::Model, ServiceError> {
        inventory_level::Entity::find_by_id(stock_code.to_string())
            .one(&*self.db)
            .await
            .map_err(|e| ServiceError::from_db(e, "find inventory level"))?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Inventory level for '{}' not found", stock_code))
            })
    }

    /// Derives the current low-stock set: every row whose availability is at
    /// or below its reorder level, at this moment.
    #[instrument(skip(self))]
    pub async fn low_stock_alerts(&self) -> Result<Vec<LowStockAlert>, ServiceError> {
        let rows = inventory_level::Entity::find()
            .filter(
                Expr::col(inventory_level::Column::AvailableStock)
                    .lte(Expr::col(inventory_level::Column::ReorderLevel)),
            )
            .order_by_asc(inventory_level::Column::StockCode)
            .all(&*self.db)
            .await
            .map_err(|e| ServiceError::from_db(e, "derive low stock alerts"))?;

        let alert_time = Utc::now();
        Ok(rows
            .into_iter()
            .map(|row| LowStockAlert {
                stock_code: row.stock_code,
                available_stock: row.available_stock,
                reorder_level: row.reorder_level,
                alert_time,
            })
            .collect())
    }
}
