use sea_orm_migration::prelude::*;

use super::m20250412_000001_create_products_table::Products;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrderLines::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderLines::OrderId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OrderLines::StockCode)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderLines::Quantity)
                            .integer()
                            .not_null()
                            .check(Expr::col(OrderLines::Quantity).gte(0)),
                    )
                    .col(
                        ColumnDef::new(OrderLines::UnitPrice)
                            .decimal_len(19, 4)
                            .not_null()
                            .check(Expr::col(OrderLines::UnitPrice).gte(0)),
                    )
                    .col(ColumnDef::new(OrderLines::CustomerId).integer().null())
                    .col(
                        ColumnDef::new(OrderLines::Status)
                            .string_len(32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(OrderLines::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_lines_stock_code")
                            .from(OrderLines::Table, OrderLines::StockCode)
                            .to(Products::Table, Products::StockCode),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_lines_stock_code")
                    .table(OrderLines::Table)
                    .col(OrderLines::StockCode)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderLines::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum OrderLines {
    Table,
    OrderId,
    StockCode,
    Quantity,
    UnitPrice,
    CustomerId,
    Status,
    CreatedAt,
}
