//! Portfolio data structures

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Side of a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    #[serde(rename = "buy")]
    Buy,
    #[serde(rename = "sell")]
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "buy" => Some(TradeSide::Buy),
            "sell" => Some(TradeSide::Sell),
            _ => None,
        }
    }
}

/// Average-cost position: one row per (user, asset), quantity always > 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub user_id: Uuid,
    pub asset_id: String,
    pub asset_symbol: String,
    pub asset_name: String,
    pub quantity: Decimal,
    pub average_buy_price: Decimal,
    /// Maintained independently of quantity * average_buy_price to avoid
    /// compounding rounding across buys.
    pub total_invested: Decimal,
}

/// Immutable record of one simulated fill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub asset_id: String,
    pub asset_symbol: String,
    pub asset_name: String,
    pub side: TradeSide,
    pub quantity: Decimal,
    pub price_per_unit: Decimal,
    pub total_amount: Decimal,
    pub timestamp: String,
}

/// Buy/sell request body. The price is the caller-asserted simulated fill
/// price, not read from the market cache.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeRequest {
    pub asset_id: String,
    pub asset_symbol: String,
    pub asset_name: String,
    pub quantity: Decimal,
    pub price_per_unit: Decimal,
}

/// Response for a completed fill.
#[derive(Debug, Serialize)]
pub struct TradeReceipt {
    pub message: String,
    pub new_balance: Decimal,
}

/// One position joined with its current market price.
#[derive(Debug, Clone, Serialize)]
pub struct Holding {
    pub asset_id: String,
    pub asset_symbol: String,
    pub asset_name: String,
    pub quantity: Decimal,
    pub average_buy_price: Decimal,
    pub current_price: Decimal,
    pub total_invested: Decimal,
    pub current_value: Decimal,
    pub profit: Decimal,
    pub profit_percentage: Decimal,
}

/// Aggregate valuation plus ranked performance views.
#[derive(Debug, Serialize)]
pub struct PortfolioSummary {
    pub total_value: Decimal,
    pub total_invested: Decimal,
    pub total_profit: Decimal,
    pub profit_percentage: Decimal,
    pub holdings: Vec<Holding>,
    pub top_performers: Vec<Holding>,
    pub top_losers: Vec<Holding>,
}

impl PortfolioSummary {
    /// Summary for an account with no positions: all-zero aggregates and
    /// empty lists, never an error.
    pub fn empty() -> Self {
        Self {
            total_value: Decimal::ZERO,
            total_invested: Decimal::ZERO,
            total_profit: Decimal::ZERO,
            profit_percentage: Decimal::ZERO,
            holdings: Vec::new(),
            top_performers: Vec::new(),
            top_losers: Vec::new(),
        }
    }
}
