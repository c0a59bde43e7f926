use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Domain events emitted after state changes commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Product catalog events
    ProductCreated(i64),
    ProductUpdated(i64),
    ProductDeleted(i64),

    // Movement events
    RetailLineRecorded {
        id: i64,
        stock_code: String,
        quantity: i32,
    },
    OrderPlaced {
        order_id: i64,
        stock_code: String,
        quantity: i32,
    },

    // Derived inventory signal
    LowStockDetected {
        stock_code: String,
        available_stock: i32,
        reorder_level: i32,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the consumer is gone.
    /// State changes must not roll back because nobody is listening.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(err) = self.send(event).await {
            warn!("Dropping event: {}", err);
        }
    }
}

/// Background consumer: drains the channel and logs each event. Runs until
/// every sender is dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::LowStockDetected {
                stock_code,
                available_stock,
                reorder_level,
            } => {
                warn!(
                    stock_code = %stock_code,
                    available_stock,
                    reorder_level,
                    "Low stock detected"
                );
            }
            other => {
                info!(event = ?other, "Processing event");
            }
        }
    }
    info!("Event channel closed; processor exiting");
}
