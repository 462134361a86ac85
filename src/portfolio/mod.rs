//! Portfolio Module
//! Mission: Average-cost position accounting and performance analytics

pub mod analytics;
pub mod ledger;
pub mod models;

pub use analytics::PortfolioAnalytics;
pub use ledger::{LedgerError, PositionLedger};
