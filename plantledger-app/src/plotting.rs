//! Charts for monthly and yearly cost data.

use anyhow::Result;
use plantledger_core::{analysis::YearlySummary, rollup::CostRollup};
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Draws monthly expenses as bars with income as a line over them.
pub fn plot_yearly_expenses(output_dir: &Path, summary: &YearlySummary) -> Result<PathBuf> {
    let path = output_dir.join(format!("expenses_{}.png", summary.year));
    draw_yearly_expenses(&path, summary)?;
    info!(path = %path.display(), "saved yearly expense chart");
    Ok(path)
}

fn draw_yearly_expenses(path: &Path, summary: &YearlySummary) -> Result<()> {
    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_value = summary
        .months
        .iter()
        .map(|m| m.total_expenses.max(m.total_income.unwrap_or(0.0)))
        .fold(1.0, f64::max);

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Monthly Expenses {}", summary.year),
            ("sans-serif", 40).into_font(),
        )
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..12f64, 0f64..max_value * 1.1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(12)
        .x_label_formatter(&|x| {
            MONTH_LABELS
                .get(x.floor() as usize)
                .map_or_else(String::new, |m| m.to_string())
        })
        .y_desc("Amount")
        .draw()?;

    chart
        .draw_series(summary.months.iter().map(|m| {
            let x = m.month as f64;
            Rectangle::new([(x + 0.15, 0.0), (x + 0.85, m.total_expenses)], BLUE.mix(0.6).filled())
        }))?
        .label("Expenses")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], BLUE.mix(0.6).filled()));

    chart
        .draw_series(LineSeries::new(
            summary
                .months
                .iter()
                .filter_map(|m| m.total_income.map(|i| (m.month as f64 + 0.5, i))),
            RED.stroke_width(2),
        ))?
        .label("Income")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.filled()));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// Draws the month's electricity split by usage mode.
pub fn plot_energy_breakdown(output_dir: &Path, rollup: &CostRollup) -> Result<PathBuf> {
    let path = output_dir.join(format!("energy_{}.png", rollup.period_key));
    draw_energy_breakdown(&path, rollup)?;
    info!(path = %path.display(), "saved energy breakdown chart");
    Ok(path)
}

fn draw_energy_breakdown(path: &Path, rollup: &CostRollup) -> Result<()> {
    let root = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let bars = [
        ("On demand", rollup.energy.on_demand_kwh, GREEN),
        ("Continuous", rollup.energy.continuous_kwh, RED),
        ("Working hours", rollup.energy.working_hours_kwh, BLUE),
    ];
    let max_kwh = bars.iter().map(|(_, kwh, _)| *kwh).fold(1.0, f64::max);

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Electricity by Usage Mode {}", rollup.period_key),
            ("sans-serif", 30).into_font(),
        )
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..3f64, 0f64..max_kwh * 1.1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(3)
        .x_label_formatter(&|x| {
            bars.get(x.floor() as usize)
                .map_or_else(String::new, |(label, _, _)| label.to_string())
        })
        .y_desc("kWh")
        .draw()?;

    chart.draw_series(bars.iter().enumerate().map(|(i, (_, kwh, color))| {
        let x = i as f64;
        Rectangle::new([(x + 0.2, 0.0), (x + 0.8, *kwh)], color.mix(0.7).filled())
    }))?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritable_output_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        let rollup = CostRollup {
            period_key: "2024-04".to_string(),
            ..Default::default()
        };
        assert!(plot_energy_breakdown(&missing, &rollup).is_err());
        assert!(!missing.join("energy_2024-04.png").exists());
    }
}
