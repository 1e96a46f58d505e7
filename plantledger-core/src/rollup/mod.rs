pub mod builder;
pub mod engine;
pub mod state;

pub use builder::RollupBuilder;
pub use engine::MonthlyCostAggregator;
pub use state::{CostRollup, EnergyLedger, ManualCosts, RollupSnapshot};
