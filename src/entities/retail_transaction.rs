use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One invoice line of the retail feed. Lines are written once and only
/// change through the explicit update endpoint; the insert path is what
/// drives the stock decrement.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "retail_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub invoice_no: String,

    /// References products.stock_code
    pub stock_code: String,

    pub description: Option<String>,

    pub quantity: i32,

    pub invoice_date: DateTime<Utc>,

    pub unit_price: Decimal,

    pub customer_id: Option<i32>,

    pub country: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::StockCode",
        to = "super::product::Column::StockCode"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
