//! Papertrade Backend Library
//!
//! Simulated trading backend: a cash balance per account, buys and sells at
//! caller-supplied fill prices, average-cost position accounting, and market
//! data served through a TTL cache over a rate-limited upstream feed.

pub mod api;
pub mod auth;
pub mod config;
pub mod market;
pub mod middleware;
pub mod portfolio;
pub mod state;
pub mod store;
