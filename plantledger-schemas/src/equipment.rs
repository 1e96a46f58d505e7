use serde::{Deserialize, Serialize};

/// How a piece of equipment draws power over a month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageMode {
    /// Only draws power while a technology card step runs on it.
    #[default]
    OnDemand,
    /// Runs around the clock, every day of the month.
    #[serde(rename = "continuous_24_7")]
    Continuous,
    /// Runs one nominal shift on every weekday.
    WorkingHours,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmortizationMethod {
    PercentageOfIncome,
    StraightLine,
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationPolicy {
    pub method: AmortizationMethod,
    /// Share of monthly income written off, in percent. Only read for
    /// `percentage_of_income`.
    pub percentage: Option<f64>,
    pub purchase_cost: Option<f64>,
    pub useful_life_months: Option<u32>,
}

/// A physical unit on the shop floor: a press, an oven, a compressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    /// Unique identifier referenced by technology card steps (e.g. "EQ-OVEN-01").
    pub equipment_id: String,
    pub name: String,
    /// Rated electrical power in kilowatts.
    pub power_kw: Option<f64>,
    #[serde(default)]
    pub usage_mode: UsageMode,
    pub amortization: Option<AmortizationPolicy>,
    /// Archived equipment is kept for history but excluded from every rollup.
    #[serde(default)]
    pub archived: bool,
    pub notes: Option<String>,
}

impl Equipment {
    pub fn is_active(&self) -> bool {
        !self.archived
    }

    /// The rated power, if it is a usable number. Negative or non-finite
    /// ratings are treated as unknown.
    pub fn rated_power_kw(&self) -> Option<f64> {
        self.power_kw.filter(|kw| kw.is_finite() && *kw >= 0.0)
    }

    /// The percentage-of-income amortization rate, when that is the policy.
    pub fn income_share_percentage(&self) -> Option<f64> {
        self.amortization
            .as_ref()
            .filter(|a| a.method == AmortizationMethod::PercentageOfIncome)
            .and_then(|a| a.percentage)
            .filter(|pct| pct.is_finite())
    }
}
