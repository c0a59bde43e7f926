pub mod inventory;
pub mod orders;
pub mod products;
pub mod retail;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, TransactionError};

use crate::{
    entities::{inventory_level, product},
    errors::ServiceError,
};

/// Availability after a decrement, read inside the same transaction so the
/// low-stock signal reflects the committed state.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StockLevel {
    pub available_stock: i32,
    pub reorder_level: i32,
}

impl StockLevel {
    pub fn is_low(&self) -> bool {
        self.available_stock <= self.reorder_level
    }
}

/// The positive-value guard shared by every transaction-line write. Zero is
/// permitted; negatives never reach the database.
pub(crate) fn ensure_non_negative_line(quantity: i32, unit_price: Decimal) -> Result<(), ServiceError> {
    if quantity < 0 {
        return Err(ServiceError::ValidationError(
            "quantity cannot be negative".to_string(),
        ));
    }
    if unit_price < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "unit_price cannot be negative".to_string(),
        ));
    }
    Ok(())
}

/// Applies the stock effect of an inserted transaction line, inside the
/// caller's transaction. One atomic `UPDATE ... SET x = x - qty` per table:
/// the read and write happen in a single statement, so concurrent inserts
/// against the same product serialize on the row lock and lose no updates.
///
/// Zero affected rows means the business key resolves to nothing; the error
/// aborts the surrounding transaction. The decrement itself is unconditional
/// and may take stock below zero.
pub(crate) async fn apply_stock_decrement<C>(
    conn: &C,
    stock_code: &str,
    quantity: i32,
) -> Result<StockLevel, ServiceError>
where
    C: ConnectionTrait,
{
    let now = Utc::now();

    let updated = product::Entity::update_many()
        .col_expr(
            product::Column::StockQuantity,
            Expr::col(product::Column::StockQuantity).sub(quantity),
        )
        .col_expr(product::Column::UpdatedAt, Expr::value(Some(now)))
        .filter(product::Column::StockCode.eq(stock_code))
        .exec(conn)
        .await
        .map_err(|e| ServiceError::from_db(e, "decrement product stock"))?;

    if updated.rows_affected == 0 {
        return Err(ServiceError::ReferentialViolation(format!(
            "stock_code '{stock_code}' does not reference an existing product"
        )));
    }

    let updated = inventory_level::Entity::update_many()
        .col_expr(
            inventory_level::Column::CurrentStock,
            Expr::col(inventory_level::Column::CurrentStock).sub(quantity),
        )
        .col_expr(
            inventory_level::Column::AvailableStock,
            Expr::col(inventory_level::Column::AvailableStock).sub(quantity),
        )
        .col_expr(inventory_level::Column::UpdatedAt, Expr::value(now))
        .filter(inventory_level::Column::StockCode.eq(stock_code))
        .exec(conn)
        .await
        .map_err(|e| ServiceError::from_db(e, "decrement inventory level"))?;

    if updated.rows_affected == 0 {
        return Err(ServiceError::ReferentialViolation(format!(
            "stock_code '{stock_code}' has no inventory level row"
        )));
    }

    let level = inventory_level::Entity::find_by_id(stock_code.to_string())
        .one(conn)
        .await
        .map_err(|e| ServiceError::from_db(e, "read inventory level"))?
        .ok_or_else(|| {
            ServiceError::ReferentialViolation(format!(
                "stock_code '{stock_code}' has no inventory level row"
            ))
        })?;

    Ok(StockLevel {
        available_stock: level.available_stock,
        reorder_level: level.reorder_level,
    })
}

/// Collapses sea-orm's two-layer transaction error into the service taxonomy.
pub(crate) fn flatten_transaction_error(err: TransactionError<ServiceError>) -> ServiceError {
    match err {
        TransactionError::Connection(e) => ServiceError::DatabaseError(e),
        TransactionError::Transaction(e) => e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn guard_rejects_negative_quantity() {
        let err = ensure_non_negative_line(-1, dec!(1.00)).unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn guard_rejects_negative_price() {
        let err = ensure_non_negative_line(1, dec!(-0.01)).unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn guard_permits_zero_values() {
        assert!(ensure_non_negative_line(0, Decimal::ZERO).is_ok());
    }

    #[test]
    fn stock_level_low_when_at_reorder_level() {
        let level = StockLevel {
            available_stock: 10,
            reorder_level: 10,
        };
        assert!(level.is_low());

        let level = StockLevel {
            available_stock: 11,
            reorder_level: 10,
        };
        assert!(!level.is_low());
    }
}
