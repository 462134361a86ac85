//! Position Ledger
//! Mission: Average-cost position accounting over buy/sell fills
//!
//! Every operation runs inside one SQLite transaction on the shared
//! mutex-guarded connection: the balance check, balance write, transaction
//! append, and position update commit together or not at all.

use crate::portfolio::models::{Position, TradeRequest, TradeSide, Transaction};
use crate::store::Db;
use chrono::Utc;
use rusqlite::params;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

/// Ledger errors. Terminal for the request: they reflect current true state.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// Malformed input, rejected before any mutation.
    Validation(String),
    InsufficientBalance,
    InsufficientHoldings,
    Storage(String),
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::Validation(msg) => write!(f, "Invalid trade request: {msg}"),
            LedgerError::InsufficientBalance => write!(f, "Insufficient balance"),
            LedgerError::InsufficientHoldings => write!(f, "Insufficient holdings"),
            LedgerError::Storage(msg) => write!(f, "Ledger storage failure: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<rusqlite::Error> for LedgerError {
    fn from(e: rusqlite::Error) -> Self {
        LedgerError::Storage(e.to_string())
    }
}

/// Owns the buy/sell average-cost algorithm and transaction recording.
pub struct PositionLedger {
    db: Db,
}

impl PositionLedger {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Buy `quantity` of an asset at the caller-supplied fill price.
    /// Returns the updated cash balance.
    pub fn buy(&self, user_id: Uuid, req: &TradeRequest) -> Result<Decimal, LedgerError> {
        validate(req)?;
        let total_cost = trade_total(req)?;

        let mut conn = self.db.conn();
        let tx = conn.transaction()?;

        let balance = read_balance(&tx, user_id)?;
        if balance < total_cost {
            return Err(LedgerError::InsufficientBalance);
        }

        let new_balance = balance - total_cost;
        write_balance(&tx, user_id, new_balance)?;
        append_transaction(&tx, user_id, req, TradeSide::Buy, total_cost)?;

        match read_position(&tx, user_id, &req.asset_id)? {
            Some(position) => {
                // Cost-basis averaging: each buy re-bases the average
                // proportionally to the added cost.
                let new_quantity = position
                    .quantity
                    .checked_add(req.quantity)
                    .ok_or_else(range_error)?;
                let new_invested = position
                    .total_invested
                    .checked_add(total_cost)
                    .ok_or_else(range_error)?;
                let new_avg = new_invested
                    .checked_div(new_quantity)
                    .ok_or_else(range_error)?;
                tx.execute(
                    "UPDATE positions
                     SET quantity = ?1, average_buy_price = ?2, total_invested = ?3
                     WHERE user_id = ?4 AND asset_id = ?5",
                    params![
                        new_quantity.to_string(),
                        new_avg.to_string(),
                        new_invested.to_string(),
                        user_id.to_string(),
                        req.asset_id,
                    ],
                )?;
            }
            None => {
                tx.execute(
                    "INSERT INTO positions
                     (user_id, asset_id, asset_symbol, asset_name, quantity, average_buy_price, total_invested)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        user_id.to_string(),
                        req.asset_id,
                        req.asset_symbol,
                        req.asset_name,
                        req.quantity.to_string(),
                        req.price_per_unit.to_string(),
                        total_cost.to_string(),
                    ],
                )?;
            }
        }

        tx.commit()?;
        info!(
            user = %user_id,
            asset = %req.asset_id,
            quantity = %req.quantity,
            price = %req.price_per_unit,
            "Buy filled"
        );

        Ok(new_balance)
    }

    /// Sell `quantity` of a held asset at the caller-supplied fill price.
    /// Returns the updated cash balance.
    pub fn sell(&self, user_id: Uuid, req: &TradeRequest) -> Result<Decimal, LedgerError> {
        validate(req)?;
        let total_sale = trade_total(req)?;

        let mut conn = self.db.conn();
        let tx = conn.transaction()?;

        let position = read_position(&tx, user_id, &req.asset_id)?
            .ok_or(LedgerError::InsufficientHoldings)?;
        if position.quantity < req.quantity {
            return Err(LedgerError::InsufficientHoldings);
        }

        let balance = read_balance(&tx, user_id)?;
        let new_balance = balance.checked_add(total_sale).ok_or_else(range_error)?;
        write_balance(&tx, user_id, new_balance)?;
        append_transaction(&tx, user_id, req, TradeSide::Sell, total_sale)?;

        let remaining = position.quantity - req.quantity;
        if remaining > Decimal::ZERO {
            // Invested shrinks proportionally; the average buy price of the
            // remainder is unchanged.
            let proportion_sold = req.quantity / position.quantity;
            let new_invested = position.total_invested * (Decimal::ONE - proportion_sold);
            tx.execute(
                "UPDATE positions SET quantity = ?1, total_invested = ?2
                 WHERE user_id = ?3 AND asset_id = ?4",
                params![
                    remaining.to_string(),
                    new_invested.to_string(),
                    user_id.to_string(),
                    req.asset_id,
                ],
            )?;
        } else {
            // Zero-quantity positions are deleted, never persisted.
            tx.execute(
                "DELETE FROM positions WHERE user_id = ?1 AND asset_id = ?2",
                params![user_id.to_string(), req.asset_id],
            )?;
        }

        tx.commit()?;
        info!(
            user = %user_id,
            asset = %req.asset_id,
            quantity = %req.quantity,
            price = %req.price_per_unit,
            "Sell filled"
        );

        Ok(new_balance)
    }

    /// All positions for an account.
    pub fn positions(&self, user_id: Uuid) -> Result<Vec<Position>, LedgerError> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            "SELECT user_id, asset_id, asset_symbol, asset_name, quantity, average_buy_price, total_invested
             FROM positions WHERE user_id = ?1 ORDER BY asset_id",
        )?;

        let positions = stmt
            .query_map(params![user_id.to_string()], map_position_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(positions)
    }

    /// Transaction history, most recent first.
    pub fn transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, LedgerError> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, asset_id, asset_symbol, asset_name, side, quantity, price_per_unit, total_amount, timestamp
             FROM transactions WHERE user_id = ?1
             ORDER BY timestamp DESC, rowid DESC",
        )?;

        let transactions = stmt
            .query_map(params![user_id.to_string()], |row| {
                Ok(Transaction {
                    id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
                    user_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
                    asset_id: row.get(2)?,
                    asset_symbol: row.get(3)?,
                    asset_name: row.get(4)?,
                    side: TradeSide::from_str(&row.get::<_, String>(5)?)
                        .unwrap_or(TradeSide::Buy),
                    quantity: row.get::<_, String>(6)?.parse().unwrap_or_default(),
                    price_per_unit: row.get::<_, String>(7)?.parse().unwrap_or_default(),
                    total_amount: row.get::<_, String>(8)?.parse().unwrap_or_default(),
                    timestamp: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(transactions)
    }
}

/// Decimal overflows past roughly 7.9e28; a fill too large to represent
/// is an invalid request, not a panic.
fn trade_total(req: &TradeRequest) -> Result<Decimal, LedgerError> {
    req.quantity
        .checked_mul(req.price_per_unit)
        .ok_or_else(range_error)
}

fn range_error() -> LedgerError {
    LedgerError::Validation("trade value exceeds supported range".to_string())
}

fn validate(req: &TradeRequest) -> Result<(), LedgerError> {
    if req.quantity <= Decimal::ZERO {
        return Err(LedgerError::Validation(
            "quantity must be positive".to_string(),
        ));
    }
    if req.price_per_unit <= Decimal::ZERO {
        return Err(LedgerError::Validation(
            "price must be positive".to_string(),
        ));
    }
    if req.asset_id.trim().is_empty() {
        return Err(LedgerError::Validation("asset id is required".to_string()));
    }
    Ok(())
}

fn read_balance(tx: &rusqlite::Transaction<'_>, user_id: Uuid) -> Result<Decimal, LedgerError> {
    let balance: String = tx
        .query_row(
            "SELECT balance FROM users WHERE id = ?1",
            params![user_id.to_string()],
            |row| row.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                LedgerError::Storage("unknown account".to_string())
            }
            other => other.into(),
        })?;

    balance
        .parse()
        .map_err(|_| LedgerError::Storage("corrupt balance".to_string()))
}

fn write_balance(
    tx: &rusqlite::Transaction<'_>,
    user_id: Uuid,
    balance: Decimal,
) -> Result<(), LedgerError> {
    tx.execute(
        "UPDATE users SET balance = ?1 WHERE id = ?2",
        params![balance.to_string(), user_id.to_string()],
    )?;
    Ok(())
}

fn append_transaction(
    tx: &rusqlite::Transaction<'_>,
    user_id: Uuid,
    req: &TradeRequest,
    side: TradeSide,
    total_amount: Decimal,
) -> Result<(), LedgerError> {
    tx.execute(
        "INSERT INTO transactions
         (id, user_id, asset_id, asset_symbol, asset_name, side, quantity, price_per_unit, total_amount, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            Uuid::new_v4().to_string(),
            user_id.to_string(),
            req.asset_id,
            req.asset_symbol,
            req.asset_name,
            side.as_str(),
            req.quantity.to_string(),
            req.price_per_unit.to_string(),
            total_amount.to_string(),
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn read_position(
    tx: &rusqlite::Transaction<'_>,
    user_id: Uuid,
    asset_id: &str,
) -> Result<Option<Position>, LedgerError> {
    let result = tx.query_row(
        "SELECT user_id, asset_id, asset_symbol, asset_name, quantity, average_buy_price, total_invested
         FROM positions WHERE user_id = ?1 AND asset_id = ?2",
        params![user_id.to_string(), asset_id],
        map_position_row,
    );

    match result {
        Ok(position) => Ok(Some(position)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn map_position_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Position> {
    Ok(Position {
        user_id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        asset_id: row.get(1)?,
        asset_symbol: row.get(2)?,
        asset_name: row.get(3)?,
        quantity: row.get::<_, String>(4)?.parse().unwrap_or_default(),
        average_buy_price: row.get::<_, String>(5)?.parse().unwrap_or_default(),
        total_invested: row.get::<_, String>(6)?.parse().unwrap_or_default(),
    })
}
