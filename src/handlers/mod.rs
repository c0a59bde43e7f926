pub mod common;
pub mod health;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod retail;

use std::sync::Arc;

use crate::{
    db::DbPool,
    events::EventSender,
    services::{
        inventory::InventoryService, orders::OrderService, products::ProductService,
        retail::RetailService,
    },
};

/// Aggregate of the services HTTP handlers reach through `AppState`.
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<ProductService>,
    pub retail: Arc<RetailService>,
    pub orders: Arc<OrderService>,
    pub inventory: Arc<InventoryService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            products: Arc::new(ProductService::new(db.clone(), event_sender.clone())),
            retail: Arc::new(RetailService::new(db.clone(), event_sender.clone())),
            orders: Arc::new(OrderService::new(db.clone(), event_sender)),
            inventory: Arc::new(InventoryService::new(db)),
        }
    }
}
