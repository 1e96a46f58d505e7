use super::{engine::MonthlyCostAggregator, state::ManualCosts, state::RollupSnapshot};
use crate::{error::LedgerError, period::Period};
use plantledger_schemas::{
    equipment::Equipment, expense::MonthlyExpense, production_order::ProductionOrder,
    technology_card::TechnologyCard,
};
use std::collections::HashMap;

/// A fluent builder for a `MonthlyCostAggregator`.
///
/// The builder only borrows its inputs; the aggregator never copies or
/// mutates equipment, cards, or orders.
#[derive(Default)]
pub struct RollupBuilder<'a> {
    period: Option<Period>,
    equipment: &'a [Equipment],
    technology_cards: &'a [TechnologyCard],
    production_orders: &'a [ProductionOrder],
    price_per_kwh: Option<f64>,
    total_income: Option<f64>,
    manual: ManualCosts,
}

impl<'a> RollupBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    /// Sets the equipment list. Archived units are ignored at build time.
    pub fn with_equipment(mut self, equipment: &'a [Equipment]) -> Self {
        self.equipment = equipment;
        self
    }

    pub fn with_technology_cards(mut self, cards: &'a [TechnologyCard]) -> Self {
        self.technology_cards = cards;
        self
    }

    /// Sets the production orders. They do not need to be pre-filtered; only
    /// orders completed inside the period are counted.
    pub fn with_production_orders(mut self, orders: &'a [ProductionOrder]) -> Self {
        self.production_orders = orders;
        self
    }

    pub fn with_snapshot(self, snapshot: &'a RollupSnapshot) -> Self {
        self.with_equipment(&snapshot.equipment)
            .with_technology_cards(&snapshot.technology_cards)
            .with_production_orders(&snapshot.production_orders)
    }

    pub fn with_price_per_kwh(mut self, price: Option<f64>) -> Self {
        self.price_per_kwh = price;
        self
    }

    pub fn with_total_income(mut self, income: Option<f64>) -> Self {
        self.total_income = income;
        self
    }

    pub fn with_manual_costs(mut self, manual: ManualCosts) -> Self {
        self.manual = manual;
        self
    }

    /// Takes the manual fields, price and income from an expense record.
    /// Derived fields on the record are ignored.
    pub fn with_expense(self, record: &MonthlyExpense) -> Self {
        self.with_manual_costs(ManualCosts::from_expense(record))
            .with_price_per_kwh(record.price_per_kwh)
            .with_total_income(record.total_income)
    }

    /// # Errors
    ///
    /// Returns `LedgerError::PeriodNotDefined` if no period was set.
    pub fn build(self) -> Result<MonthlyCostAggregator<'a>, LedgerError> {
        let period = self.period.ok_or(LedgerError::PeriodNotDefined)?;

        let equipment: Vec<&Equipment> =
            self.equipment.iter().filter(|e| e.is_active()).collect();
        let equipment_index = self
            .equipment
            .iter()
            .filter(|e| e.is_active())
            .map(|e| (e.equipment_id.as_str(), e))
            .collect::<HashMap<&'a str, &'a Equipment>>();

        // The first card registered for an item wins.
        let mut cards_by_item: HashMap<&str, &TechnologyCard> = HashMap::new();
        for card in self.technology_cards {
            cards_by_item
                .entry(card.produced_item_id.as_str())
                .or_insert(card);
        }

        Ok(MonthlyCostAggregator {
            period,
            equipment,
            equipment_index,
            cards_by_item,
            production_orders: self.production_orders,
            price_per_kwh: self.price_per_kwh,
            total_income: self.total_income,
            manual: self.manual,
        })
    }
}
