use crate::{
    equipment::Equipment, expense::MonthlyExpense, plan::StrategicPlan,
    production_order::ProductionOrder, technology_card::TechnologyCard,
};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Deserialize)]
pub struct EquipmentFile {
    pub schema_version: String,
    pub equipment: Vec<Equipment>,
}

#[derive(Debug, Deserialize)]
pub struct TechnologyCardFile {
    pub schema_version: String,
    pub technology_cards: Vec<TechnologyCard>,
}

#[derive(Debug, Deserialize)]
pub struct ProductionOrderFile {
    pub schema_version: String,
    pub production_orders: Vec<ProductionOrder>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanFile {
    pub schema_version: String,
    pub plans: Vec<StrategicPlan>,
}

/// The single upsert target for monthly records.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExpenseFile {
    pub schema_version: String,
    #[serde(default)]
    pub monthly_expenses: Vec<MonthlyExpense>,
}

impl Default for ExpenseFile {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            monthly_expenses: Vec::new(),
        }
    }
}
