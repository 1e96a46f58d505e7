use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionOrderStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub produced_item_id: String,
    pub planned_quantity: Option<f64>,
    pub produced_quantity: Option<f64>,
}

/// An internal work order to manufacture items, distinct from a sales order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionOrder {
    pub order_id: String,
    pub status: ProductionOrderStatus,
    pub actual_completion: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl ProductionOrder {
    pub fn is_completed(&self) -> bool {
        self.status == ProductionOrderStatus::Completed
    }
}
