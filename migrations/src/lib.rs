pub use sea_orm_migration::prelude::*;

mod m20250412_000001_create_products_table;
mod m20250412_000002_create_retail_transactions_table;
mod m20250412_000003_create_order_lines_table;
mod m20250412_000004_create_inventory_levels_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250412_000001_create_products_table::Migration),
            Box::new(m20250412_000002_create_retail_transactions_table::Migration),
            Box::new(m20250412_000003_create_order_lines_table::Migration),
            Box::new(m20250412_000004_create_inventory_levels_table::Migration),
        ]
    }
}
