use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Product catalog entry. `product_id` is the surrogate key, `stock_code`
/// the business key every other table references.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub product_id: i64,

    /// Business key, unique across the catalog
    #[sea_orm(unique)]
    #[validate(length(
        min = 1,
        max = 20,
        message = "stock_code must be between 1 and 20 characters"
    ))]
    pub stock_code: String,

    pub description: Option<String>,

    pub category_id: Option<i32>,

    /// Sale price; strictly positive, enforced here and by the schema
    #[validate(custom = "validate_unit_price")]
    pub unit_price: Decimal,

    pub stock_quantity: i32,

    pub reorder_level: i32,

    pub supplier_info: Option<String>,

    pub is_active: bool,

    pub weight: Option<Decimal>,

    pub dimensions: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: Option<DateTime<Utc>>,
}

fn validate_unit_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price <= Decimal::ZERO {
        return Err(ValidationError::new("unit_price_not_positive"));
    }
    Ok(())
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl Related<super::retail_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        super::retail_transaction::Relation::Product.def().rev()
    }
}

impl Related<super::order_line::Entity> for Entity {
    fn to() -> RelationDef {
        super::order_line::Relation::Product.def().rev()
    }
}

impl Related<super::inventory_level::Entity> for Entity {
    fn to() -> RelationDef {
        super::inventory_level::Relation::Product.def().rev()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        if insert {
            if let ActiveValue::NotSet = active_model.is_active {
                active_model.is_active = Set(true);
            }
            if let ActiveValue::NotSet = active_model.stock_quantity {
                active_model.stock_quantity = Set(0);
            }
            if let ActiveValue::NotSet = active_model.reorder_level {
                active_model.reorder_level = Set(10);
            }
            active_model.created_at = Set(Utc::now());
        }

        active_model.updated_at = Set(Some(Utc::now()));

        // The PK is unset on insert, so validate the written values directly
        // instead of converting to a full Model.
        if let ActiveValue::Set(ref code) = active_model.stock_code {
            if code.is_empty() || code.len() > 20 {
                return Err(DbErr::Custom(
                    "Validation error: stock_code must be between 1 and 20 characters".to_string(),
                ));
            }
        }
        if let ActiveValue::Set(ref price) = active_model.unit_price {
            if *price <= Decimal::ZERO {
                return Err(DbErr::Custom(
                    "Validation error: unit_price must be positive".to_string(),
                ));
            }
        }

        Ok(active_model)
    }
}
