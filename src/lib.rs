//! Shared trip expenses: who paid what, who owes whom, and how to settle up.

pub mod analytics;
pub mod balance;
pub mod config;
pub mod error;
pub mod exchange;
pub mod routes;
pub mod sample_data;
pub mod schemas;
pub mod store;

pub use balance::{compute_balances, Balances};
pub use error::{ConfigError, InvalidExpense, StoreError};
pub use exchange::{plan_settlement, Exchange};
pub use store::{TripReport, TripSnapshot, TripStore};
