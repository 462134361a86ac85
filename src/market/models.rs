//! Market data models
//!
//! Everything here is ephemeral: reconstructed from the upstream feed and
//! held only for the lifetime of a cache entry.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// One asset as reported by the upstream market-list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, deserialize_with = "de_decimal_or_zero")]
    pub current_price: Decimal,
    #[serde(default, deserialize_with = "de_f64_or_zero")]
    pub price_change_24h: f64,
    #[serde(default, deserialize_with = "de_f64_or_zero")]
    pub price_change_percentage_24h: f64,
    #[serde(default, deserialize_with = "de_f64_or_zero")]
    pub market_cap: f64,
    #[serde(default, deserialize_with = "de_u32_or_zero")]
    pub market_cap_rank: u32,
    #[serde(default, deserialize_with = "de_f64_or_zero")]
    pub total_volume: f64,
}

impl MarketSnapshot {
    /// Upstream reports symbols lowercased; display convention is uppercase.
    pub fn normalized(mut self) -> Self {
        self.symbol = self.symbol.to_uppercase();
        self
    }

    /// Case-insensitive substring match over name and symbol.
    pub fn matches_search(&self, needle_lower: &str) -> bool {
        self.name.to_lowercase().contains(needle_lower)
            || self.symbol.to_lowercase().contains(needle_lower)
    }
}

/// One point of a historical price series: (unix millis, price).
/// Serialized as a two-element array, the upstream chart wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint(pub i64, pub f64);

/// Chart response body from the history endpoint.
#[derive(Debug, Deserialize)]
pub struct MarketChart {
    #[serde(default)]
    pub prices: Vec<PricePoint>,
}

/// Snapshot plus chart, as served by the asset-detail operation.
/// The chart may be empty when the history fetch degraded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDetail {
    pub asset: MarketSnapshot,
    pub chart: Vec<PricePoint>,
}

// Upstream omits or nulls optional numeric fields; both collapse to zero.

fn de_f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

fn de_u32_or_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or(0))
}

fn de_decimal_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Decimal>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_snapshot_deserialization_with_missing_optionals() {
        let json = r#"{
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "image": "https://example.com/btc.png",
            "current_price": 50000.0,
            "market_cap": 1000000000.0,
            "market_cap_rank": 1,
            "total_volume": 50000000.0
        }"#;

        let snapshot: MarketSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.price_change_24h, 0.0);
        assert_eq!(snapshot.price_change_percentage_24h, 0.0);
        assert_eq!(snapshot.current_price, dec!(50000));
    }

    #[test]
    fn test_snapshot_tolerates_nulls() {
        let json = r#"{
            "id": "deadcoin",
            "symbol": "ded",
            "name": "Dead Coin",
            "image": "",
            "current_price": null,
            "price_change_24h": null,
            "price_change_percentage_24h": null,
            "market_cap": null,
            "market_cap_rank": null,
            "total_volume": null
        }"#;

        let snapshot: MarketSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.current_price, Decimal::ZERO);
        assert_eq!(snapshot.market_cap, 0.0);
        assert_eq!(snapshot.market_cap_rank, 0);
    }

    #[test]
    fn test_symbol_normalization() {
        let snapshot = MarketSnapshot {
            id: "ethereum".to_string(),
            symbol: "eth".to_string(),
            name: "Ethereum".to_string(),
            image: String::new(),
            current_price: dec!(3000),
            price_change_24h: 0.0,
            price_change_percentage_24h: 0.0,
            market_cap: 0.0,
            market_cap_rank: 2,
            total_volume: 0.0,
        };

        assert_eq!(snapshot.normalized().symbol, "ETH");
    }

    #[test]
    fn test_search_matches_name_and_symbol() {
        let snapshot = MarketSnapshot {
            id: "bitcoin".to_string(),
            symbol: "BTC".to_string(),
            name: "Bitcoin".to_string(),
            image: String::new(),
            current_price: dec!(50000),
            price_change_24h: 0.0,
            price_change_percentage_24h: 0.0,
            market_cap: 0.0,
            market_cap_rank: 1,
            total_volume: 0.0,
        };

        assert!(snapshot.matches_search("bit"));
        assert!(snapshot.matches_search("btc"));
        assert!(!snapshot.matches_search("eth"));
    }

    #[test]
    fn test_current_price_serializes_as_number() {
        let snapshot = MarketSnapshot {
            id: "bitcoin".to_string(),
            symbol: "BTC".to_string(),
            name: "Bitcoin".to_string(),
            image: String::new(),
            current_price: dec!(50000.25),
            price_change_24h: 0.0,
            price_change_percentage_24h: 0.0,
            market_cap: 0.0,
            market_cap_rank: 1,
            total_volume: 0.0,
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value["current_price"].is_number());
        assert_eq!(value["current_price"], serde_json::json!(50000.25));
    }

    #[test]
    fn test_price_point_wire_shape() {
        let chart: MarketChart =
            serde_json::from_str(r#"{"prices": [[1700000000000, 50000.5], [1700000060000, 50001.0]]}"#)
                .unwrap();
        assert_eq!(chart.prices.len(), 2);
        assert_eq!(chart.prices[0], PricePoint(1700000000000, 50000.5));

        let json = serde_json::to_string(&chart.prices[0]).unwrap();
        assert_eq!(json, "[1700000000000,50000.5]");
    }
}
