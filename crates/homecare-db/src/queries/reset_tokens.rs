use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;

use crate::Database;
use crate::models::ResetTokenRow;

impl Database {
    /// Only the SHA-256 hex of the token is stored.
    pub fn insert_reset_token(
        &self,
        user_id: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO password_reset_tokens (user_id, token_hash, expires_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![user_id, token_hash, expires_at],
            )?;
            Ok(())
        })
    }

    pub fn find_reset_token(&self, token_hash: &str) -> Result<Option<ResetTokenRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, user_id, expires_at, used FROM password_reset_tokens WHERE token_hash = ?1",
                    [token_hash],
                    |row| {
                        Ok(ResetTokenRow {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            expires_at: row.get(2)?,
                            used: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Marks the token used. False when it was already used, so a token can
    /// only win once even under concurrent resets.
    pub fn consume_reset_token(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE password_reset_tokens SET used = 1 WHERE id = ?1 AND used = 0",
                [id],
            )?;
            Ok(changed > 0)
        })
    }
}
