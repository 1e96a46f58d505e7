use super::{completed_between, LedgerStore};
use crate::{error::LedgerError, period::Period};
use chrono::{DateTime, Utc};
use plantledger_schemas::{
    equipment::Equipment, expense::MonthlyExpense, production_order::ProductionOrder,
    technology_card::TechnologyCard,
};
use std::collections::BTreeMap;

/// A `LedgerStore` held entirely in memory. Every fetch hands out copies.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    equipment: Vec<Equipment>,
    technology_cards: Vec<TechnologyCard>,
    production_orders: Vec<ProductionOrder>,
    expenses: BTreeMap<String, MonthlyExpense>,
    reads_fail: bool,
    writes_fail: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_equipment(mut self, equipment: Vec<Equipment>) -> Self {
        self.equipment = equipment;
        self
    }

    pub fn with_technology_cards(mut self, cards: Vec<TechnologyCard>) -> Self {
        self.technology_cards = cards;
        self
    }

    pub fn with_production_orders(mut self, orders: Vec<ProductionOrder>) -> Self {
        self.production_orders = orders;
        self
    }

    pub fn equipment_mut(&mut self) -> &mut Vec<Equipment> {
        &mut self.equipment
    }

    /// Makes every fetch fail with `LedgerError::Storage`.
    pub fn set_reads_fail(&mut self, fail: bool) {
        self.reads_fail = fail;
    }

    /// Makes every save fail with `LedgerError::Storage`.
    pub fn set_writes_fail(&mut self, fail: bool) {
        self.writes_fail = fail;
    }

    fn check_reads(&self) -> Result<(), LedgerError> {
        if self.reads_fail {
            return Err(LedgerError::Storage("memory store is offline".to_string()));
        }
        Ok(())
    }
}

impl LedgerStore for MemoryStore {
    fn fetch_monthly_expense(&self, period: Period) -> Result<Option<MonthlyExpense>, LedgerError> {
        self.check_reads()?;
        Ok(self.expenses.get(&period.key()).cloned())
    }

    fn fetch_monthly_expenses(&self) -> Result<Vec<MonthlyExpense>, LedgerError> {
        self.check_reads()?;
        Ok(self.expenses.values().cloned().collect())
    }

    fn fetch_active_equipment(&self) -> Result<Vec<Equipment>, LedgerError> {
        self.check_reads()?;
        Ok(self.equipment.iter().filter(|e| e.is_active()).cloned().collect())
    }

    fn fetch_completed_production_orders(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ProductionOrder>, LedgerError> {
        self.check_reads()?;
        Ok(completed_between(&self.production_orders, start, end))
    }

    fn fetch_technology_cards(&self) -> Result<Vec<TechnologyCard>, LedgerError> {
        self.check_reads()?;
        Ok(self.technology_cards.clone())
    }

    fn save_monthly_expense(&mut self, record: MonthlyExpense) -> Result<MonthlyExpense, LedgerError> {
        if self.writes_fail {
            return Err(LedgerError::Storage("memory store rejected the write".to_string()));
        }
        self.expenses.insert(record.id.clone(), record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use plantledger_schemas::{equipment::UsageMode, production_order::ProductionOrderStatus};

    fn order(id: &str, status: ProductionOrderStatus, ts: Option<DateTime<Utc>>) -> ProductionOrder {
        ProductionOrder {
            order_id: id.to_string(),
            status,
            actual_completion: ts,
            items: vec![],
        }
    }

    #[test]
    fn upsert_replaces_by_key() {
        let mut store = MemoryStore::new();
        let mut record = MonthlyExpense::blank(2024, 5);
        record.rent = 100.0;
        store.save_monthly_expense(record.clone()).unwrap();
        record.rent = 250.0;
        store.save_monthly_expense(record).unwrap();

        let all = store.fetch_monthly_expenses().unwrap();
        assert_eq!(all.len(), 1);
        let period = Period::new(2024, 5).unwrap();
        assert_eq!(store.fetch_monthly_expense(period).unwrap().unwrap().rent, 250.0);
    }

    #[test]
    fn only_active_equipment_is_fetched() {
        let retired = Equipment {
            equipment_id: "EQ-OLD".to_string(),
            name: "Old press".to_string(),
            power_kw: Some(5.0),
            usage_mode: UsageMode::Continuous,
            amortization: None,
            archived: true,
            notes: None,
        };
        let current = Equipment {
            equipment_id: "EQ-NEW".to_string(),
            archived: false,
            ..retired.clone()
        };
        let store = MemoryStore::new().with_equipment(vec![retired, current]);
        let active = store.fetch_active_equipment().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].equipment_id, "EQ-NEW");
    }

    #[test]
    fn completed_orders_are_filtered_by_status_and_range() {
        let inside = Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap();
        let outside = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        let store = MemoryStore::new().with_production_orders(vec![
            order("PO-1", ProductionOrderStatus::Completed, Some(inside)),
            order("PO-2", ProductionOrderStatus::Completed, Some(outside)),
            order("PO-3", ProductionOrderStatus::Cancelled, Some(inside)),
            order("PO-4", ProductionOrderStatus::Completed, None),
        ]);
        let june = Period::new(2024, 5).unwrap();
        let orders = store
            .fetch_completed_production_orders(june.first_instant(), june.end_instant())
            .unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, "PO-1");
    }

    #[test]
    fn range_is_half_open_at_the_month_end() {
        let june = Period::new(2024, 5).unwrap();
        let store = MemoryStore::new().with_production_orders(vec![
            order("PO-LAST", ProductionOrderStatus::Completed, Some(june.last_instant())),
            order("PO-JULY", ProductionOrderStatus::Completed, Some(june.end_instant())),
        ]);
        let orders = store
            .fetch_completed_production_orders(june.first_instant(), june.end_instant())
            .unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, "PO-LAST");
    }

    #[test]
    fn offline_store_fails_reads_and_writes() {
        let mut store = MemoryStore::new();
        store.set_reads_fail(true);
        assert!(store.fetch_technology_cards().is_err());
        store.set_writes_fail(true);
        assert!(store.save_monthly_expense(MonthlyExpense::blank(2024, 0)).is_err());
    }
}
