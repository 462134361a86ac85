//! User Storage
//! Mission: Store and manage user accounts on the shared SQLite database

use crate::auth::models::{User, STARTING_BALANCE};
use crate::store::Db;
use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use rusqlite::params;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

/// User storage over the shared database handle
pub struct UserStore {
    db: Db,
}

impl UserStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Create a new user with the starting cash balance.
    pub fn create_user(&self, email: &str, name: &str, password: &str) -> Result<User> {
        let password_hash = hash(password, DEFAULT_COST).context("Failed to hash password")?;

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
            password_hash,
            balance: Decimal::from(STARTING_BALANCE),
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO users (id, email, name, password_hash, balance, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id.to_string(),
                user.email,
                user.name,
                user.password_hash,
                user.balance.to_string(),
                user.created_at,
            ],
        )
        .context("Failed to insert user")?;

        info!("Created user: {} ({})", user.email, user.id);

        Ok(user)
    }

    /// Get user by email
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.db.conn();

        let mut stmt = conn.prepare(
            "SELECT id, email, name, password_hash, balance, created_at
             FROM users WHERE email = ?1",
        )?;

        let user_result = stmt.query_row(params![email], Self::map_user_row);

        match user_result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get user by id. Reads the balance fresh, not from stale claims.
    pub fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        let conn = self.db.conn();

        let mut stmt = conn.prepare(
            "SELECT id, email, name, password_hash, balance, created_at
             FROM users WHERE id = ?1",
        )?;

        let user_result = stmt.query_row(params![id.to_string()], Self::map_user_row);

        match user_result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Verify email and password
    pub fn verify_password(&self, email: &str, password: &str) -> Result<bool> {
        match self.get_user_by_email(email)? {
            Some(user) => {
                let valid =
                    verify(password, &user.password_hash).context("Failed to verify password")?;
                Ok(valid)
            }
            None => Ok(false),
        }
    }

    fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
            email: row.get(1)?,
            name: row.get(2)?,
            password_hash: row.get(3)?,
            balance: row.get::<_, String>(4)?.parse().unwrap_or_default(),
            created_at: row.get(5)?,
        })
    }
}
