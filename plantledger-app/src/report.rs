//! Plain-text reports printed by the CLI.

use plantledger_core::{
    analysis::{self, YearlySummary},
    plan::PlanTree,
    rollup::CostRollup,
};
use plantledger_schemas::expense::MonthlyExpense;
use std::fmt::{self, Write};

pub fn write_monthly_report(
    out: &mut impl Write,
    record: &MonthlyExpense,
    rollup: &CostRollup,
    currency: &str,
) -> fmt::Result {
    writeln!(out, "\n--- [Monthly Cost Report: {}] ---", record.id)?;
    writeln!(out, "========================================")?;
    writeln!(
        out,
        "Calendar: {} days, {} workdays, {} completed production orders",
        rollup.days_in_month, rollup.workdays, rollup.completed_orders
    )?;

    writeln!(out, "\nElectricity:")?;
    writeln!(out, "  - On demand (production):   {:>12.2} kWh", rollup.energy.on_demand_kwh)?;
    writeln!(out, "  - Continuous (24/7):        {:>12.2} kWh", rollup.energy.continuous_kwh)?;
    writeln!(out, "  - Working hours:            {:>12.2} kWh", rollup.energy.working_hours_kwh)?;
    writeln!(out, "  - Total:                    {:>12.2} kWh", rollup.total_electricity_kwh)?;
    match record.price_per_kwh {
        Some(price) => {
            writeln!(out, "  - Price:                    {:>12.4} {}/kWh", price, currency)?;
        }
        None => {
            writeln!(out, "  - Price:                    {:>12} (not set)", "-")?;
        }
    }
    if !rollup.energy.kwh_by_equipment.is_empty() {
        writeln!(out, "  By equipment:")?;
        for (equipment_id, kwh) in &rollup.energy.kwh_by_equipment {
            writeln!(out, "    - {:<22} {:>12.2} kWh", equipment_id, kwh)?;
        }
    }

    if !rollup.depreciation_by_equipment.is_empty() {
        writeln!(out, "\nDepreciation (share of income):")?;
        for (equipment_id, amount) in &rollup.depreciation_by_equipment {
            writeln!(out, "    - {:<22} {:>12.2} {}", equipment_id, amount, currency)?;
        }
    }

    writeln!(out, "\nMonthly Expenses:")?;
    for (label, amount) in analysis::cost_breakdown(rollup) {
        writeln!(out, "  - {:<26}{:>12.2} {}", format!("{}:", label), amount, currency)?;
    }
    writeln!(out, "  --------------------------------------")?;
    writeln!(out, "  - {:<26}{:>12.2} {}", "Total:", rollup.total_expenses, currency)?;
    if let Some(income) = record.total_income {
        writeln!(out, "  - {:<26}{:>12.2} {}", "Income:", income, currency)?;
        writeln!(out, "  - {:<26}{:>12.2} {}", "Net:", income - rollup.total_expenses, currency)?;
    }
    writeln!(out, "========================================")?;
    Ok(())
}

pub fn write_yearly_summary(out: &mut impl Write, summary: &YearlySummary, currency: &str) -> fmt::Result {
    writeln!(out, "\n--- [Yearly Summary: {}] ---", summary.year)?;
    if summary.months.is_empty() {
        writeln!(out, "No months recorded.")?;
        return Ok(());
    }
    writeln!(
        out,
        "| {:<7} | {:>12} | {:>12} | {:>12} | {:>12} | {:>12} |",
        "Month", "kWh", "Electricity", "Depreciation", "Expenses", "Income"
    )?;
    writeln!(out, "|---------|--------------|--------------|--------------|--------------|--------------|")?;
    for month in &summary.months {
        let income = month
            .total_income
            .map_or_else(|| "-".to_string(), |i| format!("{:.2}", i));
        writeln!(
            out,
            "| {:<7} | {:>12.2} | {:>12.2} | {:>12.2} | {:>12.2} | {:>12} |",
            month.key,
            month.total_electricity_kwh,
            month.electricity_cost,
            month.depreciation,
            month.total_expenses,
            income
        )?;
    }
    writeln!(
        out,
        "| {:<7} | {:>12.2} | {:>12.2} | {:>12.2} | {:>12.2} | {:>12.2} |",
        "Total",
        summary.total_electricity_kwh,
        summary.electricity_cost,
        summary.depreciation,
        summary.total_expenses,
        summary.total_income
    )?;
    writeln!(out, "\nNet result over months with income: {:.2} {}", summary.net_result(), currency)?;
    Ok(())
}

pub fn write_plan(out: &mut impl Write, tree: &PlanTree) -> fmt::Result {
    let progress = tree
        .progress()
        .map_or_else(|| "no subtasks".to_string(), |p| format!("{:.0}% complete", p * 100.0));
    writeln!(out, "{} [{}] ({})", tree.title(), tree.plan_id(), progress)?;
    for (depth, node) in tree.depth_first() {
        let mark = if node.completed { "x" } else { " " };
        writeln!(out, "{}[{}] {}", "  ".repeat(depth + 1), mark, node.title)?;
    }
    Ok(())
}
