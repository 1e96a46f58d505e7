use super::state::{CostRollup, EnergyLedger, ManualCosts};
use crate::period::{Period, SHIFT_HOURS};
use plantledger_schemas::{
    equipment::{Equipment, UsageMode},
    production_order::ProductionOrder,
    technology_card::TechnologyCard,
};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Computes the indirect costs of one month from borrowed snapshots.
///
/// Built by `RollupBuilder`. Every lookup that finds nothing contributes
/// zero; `compute` cannot fail.
pub struct MonthlyCostAggregator<'a> {
    pub(super) period: Period,
    pub(super) equipment: Vec<&'a Equipment>,
    pub(super) equipment_index: HashMap<&'a str, &'a Equipment>,
    pub(super) cards_by_item: HashMap<&'a str, &'a TechnologyCard>,
    pub(super) production_orders: &'a [ProductionOrder],
    pub(super) price_per_kwh: Option<f64>,
    pub(super) total_income: Option<f64>,
    pub(super) manual: ManualCosts,
}

impl<'a> MonthlyCostAggregator<'a> {
    pub fn period(&self) -> Period {
        self.period
    }

    pub fn compute(&self) -> CostRollup {
        let mut energy = EnergyLedger::default();
        let completed_orders = self.accumulate_on_demand(&mut energy);
        self.accumulate_continuous(&mut energy);
        self.accumulate_working_hours(&mut energy);

        let total_electricity_kwh = energy.total_kwh();
        let electricity_cost = match self.price_per_kwh {
            Some(price) if price.is_finite() => total_electricity_kwh * price,
            _ => 0.0,
        };

        let depreciation_by_equipment = self.depreciation();
        let total_depreciation: f64 = depreciation_by_equipment.values().sum();

        let total_expenses = self.manual.rent
            + self.manual.supplies
            + self.manual.cleaning
            + self.manual.repairs
            + total_depreciation
            + electricity_cost
            + self.manual.water_utilities;

        CostRollup {
            period_key: self.period.key(),
            energy,
            total_electricity_kwh,
            electricity_cost,
            total_depreciation,
            depreciation_by_equipment,
            manual: self.manual,
            total_expenses,
            completed_orders,
            workdays: self.period.workdays(),
            days_in_month: self.period.days_in_month(),
        }
    }

    /// Orders in `Completed` state whose completion falls inside the period.
    pub fn completed_orders(&self) -> impl Iterator<Item = &'a ProductionOrder> + '_ {
        completed_in_period(self.production_orders, self.period)
    }

    /// Energy drawn by technology card steps of completed orders. Returns the
    /// number of orders counted.
    fn accumulate_on_demand(&self, energy: &mut EnergyLedger) -> usize {
        let mut counted = 0;
        for order in self.completed_orders() {
            counted += 1;
            for item in &order.items {
                let quantity = match item.produced_quantity {
                    Some(q) if q > 0.0 => q,
                    _ => continue,
                };
                let Some(card) = self.cards_by_item.get(item.produced_item_id.as_str()) else {
                    debug!(
                        order = %order.order_id,
                        item = %item.produced_item_id,
                        "no technology card for produced item"
                    );
                    continue;
                };
                for step in card.steps.iter().filter(|s| s.draws_power()) {
                    let (Some(equipment_id), Some(minutes), Some(pct)) = (
                        step.equipment_id.as_deref(),
                        step.duration_minutes,
                        step.power_usage_percentage,
                    ) else {
                        continue;
                    };
                    let Some(power_kw) = self
                        .equipment_index
                        .get(equipment_id)
                        .and_then(|e| e.rated_power_kw())
                    else {
                        debug!(card = %card.card_id, equipment = equipment_id, "step equipment has no known power rating");
                        continue;
                    };
                    if !minutes.is_finite() || minutes <= 0.0 || !pct.is_finite() {
                        continue;
                    }
                    let kwh_per_run = power_kw * (pct.clamp(0.0, 100.0) / 100.0) * (minutes / 60.0);
                    let contribution = kwh_per_run * quantity;
                    energy.on_demand_kwh += contribution;
                    energy.attribute(equipment_id, contribution);
                }
            }
        }
        counted
    }

    fn accumulate_continuous(&self, energy: &mut EnergyLedger) {
        let hours = 24.0 * self.period.days_in_month() as f64;
        for unit in self.units_in_mode(UsageMode::Continuous) {
            if let Some(power_kw) = unit.rated_power_kw() {
                let kwh = power_kw * hours;
                energy.continuous_kwh += kwh;
                energy.attribute(&unit.equipment_id, kwh);
            }
        }
    }

    fn accumulate_working_hours(&self, energy: &mut EnergyLedger) {
        let hours = SHIFT_HOURS * self.period.workdays() as f64;
        for unit in self.units_in_mode(UsageMode::WorkingHours) {
            if let Some(power_kw) = unit.rated_power_kw() {
                let kwh = power_kw * hours;
                energy.working_hours_kwh += kwh;
                energy.attribute(&unit.equipment_id, kwh);
            }
        }
    }

    fn depreciation(&self) -> BTreeMap<String, f64> {
        let income = match self.total_income {
            Some(income) if income.is_finite() => income,
            _ => return BTreeMap::new(),
        };
        let mut by_equipment = BTreeMap::new();
        for unit in &self.equipment {
            if let Some(pct) = unit.income_share_percentage() {
                *by_equipment.entry(unit.equipment_id.clone()).or_insert(0.0) +=
                    income * pct / 100.0;
            }
        }
        by_equipment
    }

    fn units_in_mode(&self, mode: UsageMode) -> impl Iterator<Item = &&'a Equipment> + '_ {
        self.equipment.iter().filter(move |e| e.usage_mode == mode)
    }
}

/// Filters `orders` down to those completed within `period`.
pub fn completed_in_period(
    orders: &[ProductionOrder],
    period: Period,
) -> impl Iterator<Item = &ProductionOrder> + '_ {
    orders.iter().filter(move |order| {
        order.is_completed()
            && order
                .actual_completion
                .as_ref()
                .map_or(false, |ts| period.contains(ts))
    })
}
