//! Loads, recomputes and saves monthly expense records through a `LedgerStore`.

use crate::{
    analysis::{self, YearlySummary},
    error::LedgerError,
    events::{EventBus, LedgerEvent},
    period::Period,
    rollup::{CostRollup, RollupSnapshot},
    store::LedgerStore,
};
use plantledger_schemas::expense::MonthlyExpense;
use tracing::{debug, info};

pub struct ExpenseService<S: LedgerStore> {
    store: S,
    events: Option<EventBus>,
    default_price_per_kwh: Option<f64>,
}

impl<S: LedgerStore> ExpenseService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            events: None,
            default_price_per_kwh: None,
        }
    }

    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// Price applied to months that have never been saved.
    pub fn with_default_price_per_kwh(mut self, price: Option<f64>) -> Self {
        self.default_price_per_kwh = price;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Fetches the equipment, cards and orders a rollup of `period` reads.
    pub fn fetch_snapshot(&self, period: Period) -> Result<RollupSnapshot, LedgerError> {
        let equipment = self
            .store
            .fetch_active_equipment()
            .map_err(|e| LedgerError::load_failed("active equipment", e))?;
        let technology_cards = self
            .store
            .fetch_technology_cards()
            .map_err(|e| LedgerError::load_failed("technology cards", e))?;
        let production_orders = self
            .store
            .fetch_completed_production_orders(period.first_instant(), period.end_instant())
            .map_err(|e| LedgerError::load_failed("completed production orders", e))?;
        debug!(
            period = %period.key(),
            equipment = equipment.len(),
            cards = technology_cards.len(),
            orders = production_orders.len(),
            "fetched rollup inputs"
        );
        Ok(RollupSnapshot {
            equipment,
            technology_cards,
            production_orders,
        })
    }

    /// Recomputes the derived fields of `record` from fresh collaborator data.
    /// The id is rewritten to match the record's year and month.
    pub fn refresh(&self, record: &mut MonthlyExpense) -> Result<CostRollup, LedgerError> {
        let period = Period::new(record.year, record.month)?;
        record.id = period.key();
        let snapshot = self.fetch_snapshot(period)?;
        let rollup = analysis::calculate_monthly_costs(period, &snapshot, record)?;
        rollup.apply_to(record);
        self.publish(LedgerEvent::RollupComputed {
            key: rollup.period_key.clone(),
            total_electricity_kwh: rollup.total_electricity_kwh,
        });
        Ok(rollup)
    }

    /// The stored record for `period` (or a blank one) with derived fields
    /// recomputed. Nothing is written.
    pub fn load_monthly_expense(
        &self,
        period: Period,
    ) -> Result<(MonthlyExpense, CostRollup), LedgerError> {
        let stored = self
            .store
            .fetch_monthly_expense(period)
            .map_err(|e| LedgerError::load_failed(format!("monthly expense {}", period.key()), e))?;
        let mut record = stored.unwrap_or_else(|| {
            let mut blank = MonthlyExpense::blank(period.year(), period.month());
            blank.price_per_kwh = self.default_price_per_kwh;
            blank
        });
        let rollup = self.refresh(&mut record)?;
        Ok((record, rollup))
    }

    /// Recomputes `draft` in place and upserts it.
    ///
    /// # Errors
    ///
    /// `LedgerError::LoadFailed` if the rollup inputs could not be fetched and
    /// `LedgerError::SaveFailed` if the upsert failed. In the second case
    /// `draft` already carries the recomputed values.
    pub fn save_monthly_expense(
        &mut self,
        draft: &mut MonthlyExpense,
    ) -> Result<MonthlyExpense, LedgerError> {
        let rollup = self.refresh(draft)?;
        let saved = self
            .store
            .save_monthly_expense(draft.clone())
            .map_err(|e| LedgerError::save_failed(draft.id.clone(), e))?;
        info!(
            period = %saved.id,
            total_kwh = rollup.total_electricity_kwh,
            total_expenses = saved.total_expenses,
            "saved monthly expense"
        );
        self.publish(LedgerEvent::ExpenseSaved {
            key: saved.id.clone(),
            total_expenses: saved.total_expenses,
        });
        Ok(saved)
    }

    /// Every stored month of `year`, recomputed, folded into a summary.
    pub fn yearly_summary(&self, year: i32) -> Result<YearlySummary, LedgerError> {
        let stored = self
            .store
            .fetch_monthly_expenses()
            .map_err(|e| LedgerError::load_failed("monthly expenses", e))?;
        let mut months = Vec::new();
        for mut record in stored.into_iter().filter(|r| r.year == year) {
            let rollup = self.refresh(&mut record)?;
            months.push((record, rollup));
        }
        Ok(analysis::summarize_year(year, &months))
    }

    fn publish(&self, event: LedgerEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Topic;
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};
    use plantledger_schemas::{
        equipment::{AmortizationMethod, AmortizationPolicy, Equipment, UsageMode},
        production_order::{OrderItem, ProductionOrder, ProductionOrderStatus},
        technology_card::{StepKind, TechStep, TechnologyCard},
    };

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_equipment(vec![
                Equipment {
                    equipment_id: "EQ-FREEZER".to_string(),
                    name: "Freezer".to_string(),
                    power_kw: Some(2.0),
                    usage_mode: UsageMode::Continuous,
                    amortization: None,
                    archived: false,
                    notes: None,
                },
                Equipment {
                    equipment_id: "EQ-OVEN".to_string(),
                    name: "Oven".to_string(),
                    power_kw: Some(6.0),
                    usage_mode: UsageMode::OnDemand,
                    amortization: Some(AmortizationPolicy {
                        method: AmortizationMethod::PercentageOfIncome,
                        percentage: Some(5.0),
                        purchase_cost: Some(12_000.0),
                        useful_life_months: None,
                    }),
                    archived: false,
                    notes: None,
                },
            ])
            .with_technology_cards(vec![TechnologyCard {
                card_id: "TC-PIE".to_string(),
                produced_item_id: "PIE".to_string(),
                name: Some("Apple pie".to_string()),
                steps: vec![TechStep {
                    step_id: Some("bake".to_string()),
                    kind: StepKind::Process,
                    description: None,
                    equipment_id: Some("EQ-OVEN".to_string()),
                    duration_minutes: Some(30.0),
                    power_usage_percentage: Some(50.0),
                }],
                materials: vec![],
            }])
            .with_production_orders(vec![ProductionOrder {
                order_id: "PO-7".to_string(),
                status: ProductionOrderStatus::Completed,
                actual_completion: Some(Utc.with_ymd_and_hms(2024, 4, 18, 16, 0, 0).unwrap()),
                items: vec![OrderItem {
                    produced_item_id: "PIE".to_string(),
                    planned_quantity: Some(10.0),
                    produced_quantity: Some(10.0),
                }],
            }])
    }

    fn april() -> Period {
        Period::new(2024, 3).unwrap()
    }

    #[test]
    fn order_finished_in_the_final_millisecond_is_counted() {
        let last_moment = Utc.with_ymd_and_hms(2024, 4, 30, 23, 59, 59).unwrap()
            + chrono::Duration::microseconds(999_500);
        assert!(april().contains(&last_moment));
        let store = store().with_production_orders(vec![ProductionOrder {
            order_id: "PO-LATE".to_string(),
            status: ProductionOrderStatus::Completed,
            actual_completion: Some(last_moment),
            items: vec![OrderItem {
                produced_item_id: "PIE".to_string(),
                planned_quantity: None,
                produced_quantity: Some(10.0),
            }],
        }]);
        let (_, rollup) = ExpenseService::new(store).load_monthly_expense(april()).unwrap();
        assert_eq!(rollup.completed_orders, 1);
        assert_eq!(rollup.energy.on_demand_kwh, 15.0);
    }

    #[test]
    fn loading_an_unsaved_month_yields_a_computed_blank() {
        let service = ExpenseService::new(store()).with_default_price_per_kwh(Some(0.5));
        let (record, rollup) = service.load_monthly_expense(april()).unwrap();
        assert_eq!(record.id, "2024-04");
        assert_eq!(record.price_per_kwh, Some(0.5));
        // 1440 continuous + 10 pies * 6 kW * 50% * 0.5 h = 15
        assert_eq!(record.total_electricity_kwh, 1455.0);
        assert_eq!(record.electricity_cost, 727.5);
        assert_eq!(rollup.completed_orders, 1);
        assert!(service.store().fetch_monthly_expense(april()).unwrap().is_none());
    }

    #[test]
    fn save_overwrites_stale_derived_fields() {
        let mut service = ExpenseService::new(store());
        let mut draft = MonthlyExpense::blank(2024, 3);
        draft.id = "bogus".to_string();
        draft.rent = 2000.0;
        draft.price_per_kwh = Some(1.0);
        draft.total_income = Some(10_000.0);
        draft.electricity_cost = 1.0;
        draft.depreciation = 123_456.0;
        draft.total_expenses = -5.0;

        let saved = service.save_monthly_expense(&mut draft).unwrap();
        assert_eq!(saved.id, "2024-04");
        assert_eq!(saved.electricity_cost, 1455.0);
        assert_eq!(saved.depreciation, 500.0);
        assert_eq!(saved.total_expenses, 2000.0 + 1455.0 + 500.0);
        assert_eq!(saved, draft);
    }

    #[test]
    fn save_then_reload_is_idempotent() {
        let mut service = ExpenseService::new(store());
        let mut draft = MonthlyExpense::blank(2024, 3);
        draft.supplies = 310.25;
        draft.price_per_kwh = Some(0.37);
        draft.total_income = Some(48_250.0);
        let saved = service.save_monthly_expense(&mut draft).unwrap();

        let (reloaded, _) = service.load_monthly_expense(april()).unwrap();
        assert_eq!(reloaded, saved);

        let mut again = reloaded.clone();
        let resaved = service.save_monthly_expense(&mut again).unwrap();
        assert_eq!(resaved, saved);
        assert_eq!(service.store().fetch_monthly_expenses().unwrap().len(), 1);
    }

    #[test]
    fn equipment_changes_flow_into_the_next_load() {
        let mut service = ExpenseService::new(store());
        let mut draft = MonthlyExpense::blank(2024, 3);
        service.save_monthly_expense(&mut draft).unwrap();

        service.store_mut().equipment_mut()[0].archived = true;
        let (reloaded, _) = service.load_monthly_expense(april()).unwrap();
        assert_eq!(reloaded.total_electricity_kwh, 15.0);
    }

    #[test]
    fn fetch_failure_is_a_load_error() {
        let mut backing = store();
        backing.set_reads_fail(true);
        let service = ExpenseService::new(backing);
        let err = service.load_monthly_expense(april()).unwrap_err();
        assert!(matches!(err, LedgerError::LoadFailed { .. }));
        assert!(err.to_string().starts_with("Failed to load"));
    }

    #[test]
    fn save_failure_keeps_the_recomputed_draft() {
        let mut backing = store();
        backing.set_writes_fail(true);
        let mut service = ExpenseService::new(backing);
        let mut draft = MonthlyExpense::blank(2024, 3);
        draft.price_per_kwh = Some(2.0);

        let err = service.save_monthly_expense(&mut draft).unwrap_err();
        assert!(matches!(err, LedgerError::SaveFailed { ref key, .. } if key == "2024-04"));
        assert_eq!(draft.electricity_cost, 2910.0);
        assert!(service.store().fetch_monthly_expenses().unwrap().is_empty());
    }

    #[test]
    fn invalid_month_on_the_draft_is_rejected() {
        let mut service = ExpenseService::new(store());
        let mut draft = MonthlyExpense::blank(2024, 3);
        draft.month = 12;
        assert!(matches!(
            service.save_monthly_expense(&mut draft),
            Err(LedgerError::InvalidMonth(12))
        ));
    }

    #[test]
    fn saves_are_announced_on_the_bus() {
        let bus = EventBus::new();
        let saved_events = bus.subscribe(Topic::Expenses);
        let rollup_events = bus.subscribe(Topic::Rollups);
        let mut service = ExpenseService::new(store()).with_event_bus(bus);

        let mut draft = MonthlyExpense::blank(2024, 3);
        draft.rent = 10.0;
        service.save_monthly_expense(&mut draft).unwrap();

        assert_eq!(
            saved_events.try_recv().unwrap(),
            LedgerEvent::ExpenseSaved {
                key: "2024-04".to_string(),
                total_expenses: 10.0,
            }
        );
        assert_eq!(rollup_events.try_iter().count(), 1);
    }

    #[test]
    fn yearly_summary_recomputes_stored_months() {
        let mut service = ExpenseService::new(store());
        for month in [3, 4] {
            let mut draft = MonthlyExpense::blank(2024, month);
            draft.rent = 1000.0;
            service.save_monthly_expense(&mut draft).unwrap();
        }
        let mut other_year = MonthlyExpense::blank(2023, 3);
        service.save_monthly_expense(&mut other_year).unwrap();

        let summary = service.yearly_summary(2024).unwrap();
        assert_eq!(summary.months.len(), 2);
        assert_eq!(summary.total_expenses, 2000.0);
        // April: 1440 + 15; May: 2 kW * 24 * 31
        assert_eq!(summary.total_electricity_kwh, 1455.0 + 1488.0);
    }
}
