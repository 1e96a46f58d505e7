use crate::{
    error::LedgerError,
    period::Period,
    rollup::{CostRollup, RollupBuilder, RollupSnapshot},
};
use plantledger_schemas::expense::MonthlyExpense;
use serde::Serialize;

/// Runs the monthly rollup for `record` against a snapshot of collaborator data.
pub fn calculate_monthly_costs(
    period: Period,
    snapshot: &RollupSnapshot,
    record: &MonthlyExpense,
) -> Result<CostRollup, LedgerError> {
    let aggregator = RollupBuilder::new()
        .with_period(period)
        .with_snapshot(snapshot)
        .with_expense(record)
        .build()?;
    Ok(aggregator.compute())
}

/// The components of a month's total, in report order.
pub fn cost_breakdown(rollup: &CostRollup) -> Vec<(&'static str, f64)> {
    vec![
        ("Rent", rollup.manual.rent),
        ("Supplies", rollup.manual.supplies),
        ("Cleaning", rollup.manual.cleaning),
        ("Repairs", rollup.manual.repairs),
        ("Depreciation", rollup.total_depreciation),
        ("Electricity", rollup.electricity_cost),
        ("Water & utilities", rollup.manual.water_utilities),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthSummary {
    pub key: String,
    pub month: u32,
    pub total_electricity_kwh: f64,
    pub electricity_cost: f64,
    pub depreciation: f64,
    pub total_expenses: f64,
    pub total_income: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YearlySummary {
    pub year: i32,
    pub months: Vec<MonthSummary>,
    pub total_electricity_kwh: f64,
    pub electricity_cost: f64,
    pub depreciation: f64,
    pub total_expenses: f64,
    pub total_income: f64,
}

impl YearlySummary {
    /// Income minus expenses over the months that recorded an income.
    pub fn net_result(&self) -> f64 {
        self.months
            .iter()
            .filter_map(|m| m.total_income.map(|income| income - m.total_expenses))
            .sum()
    }
}

/// Folds per-month rollups into a yearly summary, ordered by month.
pub fn summarize_year(year: i32, months: &[(MonthlyExpense, CostRollup)]) -> YearlySummary {
    let mut summary = YearlySummary {
        year,
        ..Default::default()
    };
    let mut rows: Vec<&(MonthlyExpense, CostRollup)> =
        months.iter().filter(|(record, _)| record.year == year).collect();
    rows.sort_by_key(|(record, _)| record.month);

    for (record, rollup) in rows {
        summary.total_electricity_kwh += rollup.total_electricity_kwh;
        summary.electricity_cost += rollup.electricity_cost;
        summary.depreciation += rollup.total_depreciation;
        summary.total_expenses += rollup.total_expenses;
        summary.total_income += record.total_income.unwrap_or(0.0);
        summary.months.push(MonthSummary {
            key: record.key(),
            month: record.month,
            total_electricity_kwh: rollup.total_electricity_kwh,
            electricity_cost: rollup.electricity_cost,
            depreciation: rollup.total_depreciation,
            total_expenses: rollup.total_expenses,
            total_income: record.total_income,
        });
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantledger_schemas::equipment::{Equipment, UsageMode};

    fn snapshot() -> RollupSnapshot {
        RollupSnapshot {
            equipment: vec![Equipment {
                equipment_id: "EQ-HEATER".to_string(),
                name: "Heater".to_string(),
                power_kw: Some(1.0),
                usage_mode: UsageMode::Continuous,
                amortization: None,
                archived: false,
                notes: None,
            }],
            ..Default::default()
        }
    }

    fn month(year: i32, month: u32, rent: f64, income: Option<f64>) -> (MonthlyExpense, CostRollup) {
        let mut record = MonthlyExpense::blank(year, month);
        record.rent = rent;
        record.price_per_kwh = Some(1.0);
        record.total_income = income;
        let period = Period::new(year, month).unwrap();
        let rollup = calculate_monthly_costs(period, &snapshot(), &record).unwrap();
        (record, rollup)
    }

    #[test]
    fn stale_derived_fields_on_the_record_are_ignored() {
        let mut record = MonthlyExpense::blank(2024, 3);
        record.total_electricity_kwh = 99_999.0;
        record.electricity_cost = 99_999.0;
        record.price_per_kwh = Some(2.0);
        let rollup = calculate_monthly_costs(Period::new(2024, 3).unwrap(), &snapshot(), &record).unwrap();
        assert_eq!(rollup.total_electricity_kwh, 720.0);
        assert_eq!(rollup.electricity_cost, 1440.0);
    }

    #[test]
    fn breakdown_adds_up_to_the_total() {
        let (_, rollup) = month(2024, 3, 500.0, None);
        let sum: f64 = cost_breakdown(&rollup).iter().map(|(_, v)| v).sum();
        assert_eq!(sum, rollup.total_expenses);
    }

    #[test]
    fn yearly_summary_is_sorted_and_scoped_to_the_year() {
        let months = vec![
            month(2024, 2, 100.0, Some(2000.0)),
            month(2024, 0, 100.0, None),
            month(2023, 11, 100.0, Some(5000.0)),
        ];
        let summary = summarize_year(2024, &months);
        assert_eq!(summary.months.len(), 2);
        assert_eq!(summary.months[0].key, "2024-01");
        assert_eq!(summary.months[1].key, "2024-03");
        // January: 31 days * 24 kWh, March: 31 days * 24 kWh
        assert_eq!(summary.total_electricity_kwh, 1488.0);
        assert_eq!(summary.total_income, 2000.0);
        assert_eq!(summary.net_result(), 2000.0 - (100.0 + 744.0));
    }
}
