use sea_orm_migration::prelude::*;

use super::m20250412_000001_create_products_table::Products;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // No non-negative check here: the stock decrement is unconditional and
        // availability is allowed to go below zero.
        manager
            .create_table(
                Table::create()
                    .table(InventoryLevels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryLevels::StockCode)
                            .string_len(20)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InventoryLevels::CurrentStock)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(InventoryLevels::AvailableStock)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(InventoryLevels::ReorderLevel)
                            .integer()
                            .not_null()
                            .default(10),
                    )
                    .col(
                        ColumnDef::new(InventoryLevels::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_levels_stock_code")
                            .from(InventoryLevels::Table, InventoryLevels::StockCode)
                            .to(Products::Table, Products::StockCode),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InventoryLevels::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum InventoryLevels {
    Table,
    StockCode,
    CurrentStock,
    AvailableStock,
    ReorderLevel,
    UpdatedAt,
}
