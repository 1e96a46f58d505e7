use crate::error::LedgerError;
use csv::Writer;
use plantledger_schemas::expense::MonthlyExpense;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Serialize)]
struct LedgerRow<'a> {
    period: &'a str,
    year: i32,
    month: u32,
    rent: f64,
    supplies: f64,
    cleaning: f64,
    repairs: f64,
    water_utilities: f64,
    price_per_kwh: Option<f64>,
    total_income: Option<f64>,
    total_electricity_kwh: f64,
    electricity_cost: f64,
    depreciation: f64,
    total_expenses: f64,
}

/// Writes monthly records as CSV rows, one per month.
pub struct LedgerCsvWriter<W: io::Write> {
    writer: Writer<W>,
    label: String,
}

impl LedgerCsvWriter<fs::File> {
    pub fn create(path: &Path) -> Result<Self, LedgerError> {
        let label = path.display().to_string();
        let writer = Writer::from_path(path).map_err(|e| LedgerError::CsvError(label.clone(), e))?;
        Ok(Self { writer, label })
    }
}

impl<W: io::Write> LedgerCsvWriter<W> {
    pub fn from_writer(inner: W, label: &str) -> Self {
        Self {
            writer: Writer::from_writer(inner),
            label: label.to_string(),
        }
    }

    pub fn write_expense(&mut self, record: &MonthlyExpense) -> Result<(), LedgerError> {
        let row = LedgerRow {
            period: &record.id,
            year: record.year,
            month: record.month + 1,
            rent: record.rent,
            supplies: record.supplies,
            cleaning: record.cleaning,
            repairs: record.repairs,
            water_utilities: record.water_utilities,
            price_per_kwh: record.price_per_kwh,
            total_income: record.total_income,
            total_electricity_kwh: record.total_electricity_kwh,
            electricity_cost: record.electricity_cost,
            depreciation: record.depreciation,
            total_expenses: record.total_expenses,
        };
        self.writer
            .serialize(row)
            .map_err(|e| LedgerError::CsvError(self.label.clone(), e))
    }

    /// Flushes and hands back the underlying writer.
    pub fn finish(self) -> Result<W, LedgerError> {
        let label = self.label;
        self.writer
            .into_inner()
            .map_err(|e| LedgerError::FileIO(label, io::Error::new(e.error().kind(), e.to_string())))
    }
}

/// Writes every record to `path`, returning the number of rows.
pub fn export_expenses(path: &Path, records: &[MonthlyExpense]) -> Result<usize, LedgerError> {
    let mut writer = LedgerCsvWriter::create(path)?;
    for record in records {
        writer.write_expense(record)?;
    }
    writer.finish()?;
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_use_one_based_months_and_blank_optionals() {
        let mut record = MonthlyExpense::blank(2024, 0);
        record.rent = 1200.0;
        record.total_expenses = 1200.0;
        let mut writer = LedgerCsvWriter::from_writer(Vec::new(), "buffer");
        writer.write_expense(&record).unwrap();
        let bytes = writer.finish().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "period,year,month,rent,supplies,cleaning,repairs,water_utilities,price_per_kwh,total_income,total_electricity_kwh,electricity_cost,depreciation,total_expenses"
        );
        assert_eq!(lines.next().unwrap(), "2024-01,2024,1,1200.0,0.0,0.0,0.0,0.0,,,0.0,0.0,0.0,1200.0");
        assert!(lines.next().is_none());
    }
}
