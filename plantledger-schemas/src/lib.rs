//! Serializable data model for the PlantLedger workspace.
//!
//! Every type here mirrors a record kept in the data directory. The types
//! carry no business logic beyond small accessors; the rollup itself lives
//! in `plantledger-core`.

pub mod equipment;
pub mod expense;
pub mod file_formats;
pub mod plan;
pub mod production_order;
pub mod technology_card;
