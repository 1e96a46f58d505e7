//! Monthly cost accounting for a small manufacturing shop.
//!
//! The heart of the crate is [`rollup::MonthlyCostAggregator`], which turns
//! equipment, technology cards and completed production orders into the
//! energy, depreciation and total indirect costs of one calendar month.
//! [`service::ExpenseService`] wraps it with load/save semantics over any
//! [`store::LedgerStore`].

pub mod analysis;
pub mod error;
pub mod events;
pub mod export;
pub mod period;
pub mod plan;
pub mod rollup;
pub mod service;
pub mod store;

pub use error::LedgerError;
pub use period::Period;
