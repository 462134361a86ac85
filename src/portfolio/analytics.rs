//! Portfolio Analytics
//! Mission: Join ledger positions with cached market prices into valuation
//! and ranked performance views

use crate::market::{FeedOutcome, MarketCache, MarketSnapshot, PriceFeedClient, MARKET_LIST_KEY};
use crate::portfolio::ledger::{LedgerError, PositionLedger};
use crate::portfolio::models::{Holding, PortfolioSummary, Position};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

pub struct PortfolioAnalytics {
    ledger: Arc<PositionLedger>,
    cache: Arc<MarketCache<Vec<MarketSnapshot>>>,
    feed: Arc<PriceFeedClient>,
    list_ttl: Duration,
}

impl PortfolioAnalytics {
    pub fn new(
        ledger: Arc<PositionLedger>,
        cache: Arc<MarketCache<Vec<MarketSnapshot>>>,
        feed: Arc<PriceFeedClient>,
        list_ttl: Duration,
    ) -> Self {
        Self {
            ledger,
            cache,
            feed,
            list_ttl,
        }
    }

    /// Valuation and performance for one account. A failed price lookup is
    /// not fatal: missing assets are valued at price 0, a conservative view.
    pub async fn summarize(&self, user_id: Uuid) -> Result<PortfolioSummary, LedgerError> {
        let positions = self.ledger.positions(user_id)?;
        if positions.is_empty() {
            return Ok(PortfolioSummary::empty());
        }

        let prices = match self
            .cache
            .get_or_fetch(MARKET_LIST_KEY, self.list_ttl, || self.feed.list_markets())
            .await
        {
            Ok(list) => price_map(&list),
            Err(e) => {
                warn!(user = %user_id, error = %e, "Price lookup failed, valuing at zero");
                HashMap::new()
            }
        };

        Ok(build_summary(positions, &prices))
    }
}

/// Current price per asset id from a market-list payload.
pub fn price_map(list: &[MarketSnapshot]) -> HashMap<String, Decimal> {
    list.iter()
        .map(|m| (m.id.clone(), m.current_price))
        .collect()
}

/// Pure aggregation over positions and a price map.
pub fn build_summary(
    positions: Vec<Position>,
    prices: &HashMap<String, Decimal>,
) -> PortfolioSummary {
    let mut holdings: Vec<Holding> = Vec::with_capacity(positions.len());
    let mut total_value = Decimal::ZERO;
    let mut total_invested = Decimal::ZERO;

    for position in positions {
        let current_price = prices
            .get(&position.asset_id)
            .copied()
            .unwrap_or(Decimal::ZERO);
        let current_value = position.quantity * current_price;
        let profit = current_value - position.total_invested;
        let profit_percentage = percentage(profit, position.total_invested);

        total_value += current_value;
        total_invested += position.total_invested;

        holdings.push(Holding {
            asset_id: position.asset_id,
            asset_symbol: position.asset_symbol,
            asset_name: position.asset_name,
            quantity: position.quantity,
            average_buy_price: position.average_buy_price,
            current_price,
            total_invested: position.total_invested,
            current_value,
            profit,
            profit_percentage,
        });
    }

    let total_profit = total_value - total_invested;
    let profit_percentage = percentage(total_profit, total_invested);

    // Both views are slices of the same sorted list; with 4-6 holdings they
    // can overlap, which is the intended behavior.
    let mut sorted = holdings.clone();
    sorted.sort_by(|a, b| b.profit_percentage.cmp(&a.profit_percentage));

    let top_performers: Vec<Holding> = sorted.iter().take(3).cloned().collect();
    let top_losers: Vec<Holding> = if sorted.len() > 3 {
        sorted.iter().rev().take(3).cloned().collect()
    } else {
        Vec::new()
    };

    PortfolioSummary {
        total_value,
        total_invested,
        total_profit,
        profit_percentage,
        holdings,
        top_performers,
        top_losers,
    }
}

fn percentage(profit: Decimal, invested: Decimal) -> Decimal {
    if invested > Decimal::ZERO {
        profit / invested * HUNDRED
    } else {
        Decimal::ZERO
    }
}
