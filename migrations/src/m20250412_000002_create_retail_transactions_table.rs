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
                    .table(RetailTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RetailTransactions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RetailTransactions::InvoiceNo)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RetailTransactions::StockCode)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(RetailTransactions::Description).text().null())
                    .col(
                        ColumnDef::new(RetailTransactions::Quantity)
                            .integer()
                            .not_null()
                            .check(Expr::col(RetailTransactions::Quantity).gte(0)),
                    )
                    .col(
                        ColumnDef::new(RetailTransactions::InvoiceDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(RetailTransactions::UnitPrice)
                            .decimal_len(19, 4)
                            .not_null()
                            .check(Expr::col(RetailTransactions::UnitPrice).gte(0)),
                    )
                    .col(ColumnDef::new(RetailTransactions::CustomerId).integer().null())
                    .col(ColumnDef::new(RetailTransactions::Country).string_len(64).null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_retail_transactions_stock_code")
                            .from(RetailTransactions::Table, RetailTransactions::StockCode)
                            .to(Products::Table, Products::StockCode),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_retail_transactions_invoice_no")
                    .table(RetailTransactions::Table)
                    .col(RetailTransactions::InvoiceNo)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_retail_transactions_stock_code")
                    .table(RetailTransactions::Table)
                    .col(RetailTransactions::StockCode)
                    .to_owned(),
            )
            .await?;

        // Monthly aggregates scan by date range
        manager
            .create_index(
                Index::create()
                    .name("idx_retail_transactions_invoice_date")
                    .table(RetailTransactions::Table)
                    .col(RetailTransactions::InvoiceDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RetailTransactions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum RetailTransactions {
    Table,
    Id,
    InvoiceNo,
    StockCode,
    Description,
    Quantity,
    InvoiceDate,
    UnitPrice,
    CustomerId,
    Country,
}
