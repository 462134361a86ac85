//! End-to-end trading flow over real SQLite storage: register, buy, sell,
//! then summarize against cached market prices.

use papertrade_backend::{
    auth::UserStore,
    market::{FeedOutcome, MarketCache, MarketSnapshot, PriceFeedClient, MARKET_LIST_KEY},
    portfolio::{PortfolioAnalytics, PositionLedger},
    portfolio::models::{TradeRequest, TradeSide},
    store::Db,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

const TTL: Duration = Duration::from_secs(300);

fn trade(asset: &str, symbol: &str, quantity: Decimal, price: Decimal) -> TradeRequest {
    TradeRequest {
        asset_id: asset.to_string(),
        asset_symbol: symbol.to_string(),
        asset_name: asset.to_string(),
        quantity,
        price_per_unit: price,
    }
}

fn snapshot(id: &str, symbol: &str, price: Decimal) -> MarketSnapshot {
    MarketSnapshot {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: id.to_string(),
        image: String::new(),
        current_price: price,
        price_change_24h: 0.0,
        price_change_percentage_24h: 0.0,
        market_cap: 0.0,
        market_cap_rank: 1,
        total_volume: 0.0,
    }
}

#[tokio::test]
async fn test_register_buy_sell_summarize_flow() {
    let temp = NamedTempFile::new().unwrap();
    let db = Db::open(temp.path().to_str().unwrap()).unwrap();

    let users = UserStore::new(db.clone());
    let ledger = Arc::new(PositionLedger::new(db));

    let user = users
        .create_user("flow@example.com", "Flow", "password123")
        .unwrap();
    assert_eq!(user.balance, dec!(10000));

    // Two buys: 0.001 BTC at 50000 and 0.01 ETH at 3000.
    let balance = ledger
        .buy(user.id, &trade("bitcoin", "BTC", dec!(0.001), dec!(50000)))
        .unwrap();
    assert_eq!(balance, dec!(9950));

    let balance = ledger
        .buy(user.id, &trade("ethereum", "ETH", dec!(0.01), dec!(3000)))
        .unwrap();
    assert_eq!(balance, dec!(9920));

    // Analytics over a pre-warmed price cache; the feed client never fires
    // because the market-list entry is fresh.
    let market_cache: Arc<MarketCache<Vec<MarketSnapshot>>> = Arc::new(MarketCache::new());
    market_cache
        .get_or_fetch(MARKET_LIST_KEY, TTL, || async {
            FeedOutcome::Success(vec![
                snapshot("bitcoin", "BTC", dec!(60000)),
                snapshot("ethereum", "ETH", dec!(2000)),
            ])
        })
        .await
        .unwrap();

    let feed = Arc::new(
        PriceFeedClient::new(Some("http://127.0.0.1:1".to_string()), Duration::ZERO).unwrap(),
    );
    let analytics = PortfolioAnalytics::new(ledger.clone(), market_cache, feed, TTL);

    let summary = analytics.summarize(user.id).await.unwrap();
    assert_eq!(summary.total_invested, dec!(80));
    // 0.001 * 60000 + 0.01 * 2000
    assert_eq!(summary.total_value, dec!(80));
    assert_eq!(summary.holdings.len(), 2);
    assert!(summary.top_losers.is_empty());

    // Sell the whole BTC position at a profit.
    let balance = ledger
        .sell(user.id, &trade("bitcoin", "BTC", dec!(0.001), dec!(60000)))
        .unwrap();
    assert_eq!(balance, dec!(9980));

    let positions = ledger.positions(user.id).unwrap();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].asset_id, "ethereum");

    // Three fills, newest first.
    let transactions = ledger.transactions(user.id).unwrap();
    assert_eq!(transactions.len(), 3);
    assert_eq!(transactions[0].side, TradeSide::Sell);
    assert_eq!(transactions[0].asset_id, "bitcoin");
    assert_eq!(transactions[1].asset_id, "ethereum");
    assert_eq!(transactions[2].asset_id, "bitcoin");

    // The balance the store reports matches the ledger's receipt.
    let fresh = users.get_user_by_id(&user.id).unwrap().unwrap();
    assert_eq!(fresh.balance, dec!(9980));
}

#[tokio::test]
async fn test_summary_for_account_with_no_positions() {
    let temp = NamedTempFile::new().unwrap();
    let db = Db::open(temp.path().to_str().unwrap()).unwrap();

    let users = UserStore::new(db.clone());
    let ledger = Arc::new(PositionLedger::new(db));
    let user = users
        .create_user("idle@example.com", "Idle", "password123")
        .unwrap();

    let market_cache = Arc::new(MarketCache::new());
    let feed = Arc::new(
        PriceFeedClient::new(Some("http://127.0.0.1:1".to_string()), Duration::ZERO).unwrap(),
    );
    let analytics = PortfolioAnalytics::new(ledger, market_cache, feed, TTL);

    // No positions: zero aggregates and empty lists, and the price feed is
    // never consulted.
    let summary = analytics.summarize(user.id).await.unwrap();
    assert_eq!(summary.total_value, Decimal::ZERO);
    assert_eq!(summary.total_invested, Decimal::ZERO);
    assert_eq!(summary.profit_percentage, Decimal::ZERO);
    assert!(summary.holdings.is_empty());
    assert!(summary.top_performers.is_empty());
    assert!(summary.top_losers.is_empty());
}

#[tokio::test]
async fn test_price_lookup_failure_values_holdings_at_zero() {
    let temp = NamedTempFile::new().unwrap();
    let db = Db::open(temp.path().to_str().unwrap()).unwrap();

    let users = UserStore::new(db.clone());
    let ledger = Arc::new(PositionLedger::new(db));
    let user = users
        .create_user("degraded@example.com", "Degraded", "password123")
        .unwrap();

    ledger
        .buy(user.id, &trade("bitcoin", "BTC", dec!(0.001), dec!(50000)))
        .unwrap();

    // Empty cache + unreachable feed: the summary degrades instead of
    // failing, valuing the holding at zero.
    let market_cache = Arc::new(MarketCache::new());
    let feed = Arc::new(
        PriceFeedClient::new(Some("http://127.0.0.1:1".to_string()), Duration::ZERO).unwrap(),
    );
    let analytics = PortfolioAnalytics::new(ledger, market_cache, feed, TTL);

    let summary = analytics.summarize(user.id).await.unwrap();
    assert_eq!(summary.total_invested, dec!(50));
    assert_eq!(summary.total_value, Decimal::ZERO);
    assert_eq!(summary.total_profit, dec!(-50));
    assert_eq!(summary.holdings[0].current_price, Decimal::ZERO);
}
