use serde::{Deserialize, Serialize};

/// The storage key of a monthly record: `YYYY-MM` with a 1-based month.
pub fn period_key(year: i32, month: u32) -> String {
    format!("{}-{:02}", year, month + 1)
}

/// Indirect costs for one calendar month.
///
/// `rent` through `price_per_kwh` are entered by hand. `total_electricity_kwh`,
/// `electricity_cost`, `depreciation` and `total_expenses` are derived and get
/// overwritten every time the record is loaded or saved. `total_income` comes
/// from the accounting side and is carried through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyExpense {
    pub id: String,
    pub year: i32,
    /// Zero-based month (0 = January).
    pub month: u32,
    #[serde(default)]
    pub rent: f64,
    #[serde(default)]
    pub supplies: f64,
    #[serde(default)]
    pub cleaning: f64,
    #[serde(default)]
    pub repairs: f64,
    #[serde(default)]
    pub water_utilities: f64,
    pub price_per_kwh: Option<f64>,
    pub total_income: Option<f64>,
    #[serde(default)]
    pub total_electricity_kwh: f64,
    #[serde(default)]
    pub electricity_cost: f64,
    #[serde(default)]
    pub depreciation: f64,
    #[serde(default)]
    pub total_expenses: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl MonthlyExpense {
    /// An empty record for the given month with every amount at zero.
    pub fn blank(year: i32, month: u32) -> Self {
        Self {
            id: period_key(year, month),
            year,
            month,
            rent: 0.0,
            supplies: 0.0,
            cleaning: 0.0,
            repairs: 0.0,
            water_utilities: 0.0,
            price_per_kwh: None,
            total_income: None,
            total_electricity_kwh: 0.0,
            electricity_cost: 0.0,
            depreciation: 0.0,
            total_expenses: 0.0,
            notes: None,
        }
    }

    pub fn key(&self) -> String {
        period_key(self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_zero_padded_and_one_based() {
        assert_eq!(period_key(2024, 0), "2024-01");
        assert_eq!(period_key(2023, 11), "2023-12");
        assert_eq!(MonthlyExpense::blank(2025, 8).id, "2025-09");
    }

    #[test]
    fn missing_amounts_default_to_zero() {
        let yaml = "id: 2024-03\nyear: 2024\nmonth: 2\nrent: 1500\n";
        let record: MonthlyExpense = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(record.rent, 1500.0);
        assert_eq!(record.cleaning, 0.0);
        assert_eq!(record.price_per_kwh, None);
        assert_eq!(record.key(), "2024-03");
    }
}
