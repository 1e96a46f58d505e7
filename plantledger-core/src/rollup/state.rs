use plantledger_schemas::{
    equipment::Equipment, expense::MonthlyExpense, production_order::ProductionOrder,
    technology_card::TechnologyCard,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// The hand-entered cost components of a month.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct ManualCosts {
    pub rent: f64,
    pub supplies: f64,
    pub cleaning: f64,
    pub repairs: f64,
    pub water_utilities: f64,
}

impl ManualCosts {
    pub fn from_expense(record: &MonthlyExpense) -> Self {
        Self {
            rent: record.rent,
            supplies: record.supplies,
            cleaning: record.cleaning,
            repairs: record.repairs,
            water_utilities: record.water_utilities,
        }
    }
}

/// Energy consumed in a month, split by how it was drawn.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct EnergyLedger {
    pub on_demand_kwh: f64,
    pub continuous_kwh: f64,
    pub working_hours_kwh: f64,
    pub kwh_by_equipment: BTreeMap<String, f64>,
}

impl EnergyLedger {
    pub fn total_kwh(&self) -> f64 {
        self.on_demand_kwh + self.continuous_kwh + self.working_hours_kwh
    }

    pub(crate) fn attribute(&mut self, equipment_id: &str, kwh: f64) {
        *self
            .kwh_by_equipment
            .entry(equipment_id.to_string())
            .or_insert(0.0) += kwh;
    }
}

/// The result of one monthly rollup.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CostRollup {
    pub period_key: String,
    pub energy: EnergyLedger,
    pub total_electricity_kwh: f64,
    pub electricity_cost: f64,
    pub total_depreciation: f64,
    pub depreciation_by_equipment: BTreeMap<String, f64>,
    pub manual: ManualCosts,
    pub total_expenses: f64,
    pub completed_orders: usize,
    pub workdays: u32,
    pub days_in_month: u32,
}

impl CostRollup {
    /// Overwrites the derived fields of `record` with this rollup.
    pub fn apply_to(&self, record: &mut MonthlyExpense) {
        record.total_electricity_kwh = self.total_electricity_kwh;
        record.electricity_cost = self.electricity_cost;
        record.depreciation = self.total_depreciation;
        record.total_expenses = self.total_expenses;
    }
}

/// Owned copies of the collaborator data a rollup reads.
#[derive(Debug, Default, Clone)]
pub struct RollupSnapshot {
    pub equipment: Vec<Equipment>,
    pub technology_cards: Vec<TechnologyCard>,
    pub production_orders: Vec<ProductionOrder>,
}
