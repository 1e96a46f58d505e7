//! The storage collaborator the expense service reads from and writes to.

pub mod memory;

pub use memory::MemoryStore;

use crate::{error::LedgerError, period::Period};
use chrono::{DateTime, Utc};
use plantledger_schemas::{
    equipment::Equipment, expense::MonthlyExpense, production_order::ProductionOrder,
    technology_card::TechnologyCard,
};

pub trait LedgerStore {
    fn fetch_monthly_expense(&self, period: Period) -> Result<Option<MonthlyExpense>, LedgerError>;

    /// Every stored monthly record, ordered by key.
    fn fetch_monthly_expenses(&self) -> Result<Vec<MonthlyExpense>, LedgerError>;

    /// Equipment that is not archived.
    fn fetch_active_equipment(&self) -> Result<Vec<Equipment>, LedgerError>;

    /// Orders in `Completed` state whose completion lies in `[start, end)`.
    fn fetch_completed_production_orders(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ProductionOrder>, LedgerError>;

    fn fetch_technology_cards(&self) -> Result<Vec<TechnologyCard>, LedgerError>;

    /// Inserts or replaces the record stored under `record.id`.
    fn save_monthly_expense(&mut self, record: MonthlyExpense) -> Result<MonthlyExpense, LedgerError>;
}

/// Orders in `Completed` state whose completion lies in `[start, end)`.
pub fn completed_between(
    orders: &[ProductionOrder],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<ProductionOrder> {
    orders
        .iter()
        .filter(|o| {
            o.is_completed()
                && o.actual_completion
                    .map_or(false, |ts| ts >= start && ts < end)
        })
        .cloned()
        .collect()
}
