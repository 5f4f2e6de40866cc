use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use super::Store;
use crate::error::StoreError;
use crate::util::time;

/// A sign-in identity. Emails are stored lower-cased; `password_hash` is an
/// Argon2 PHC string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
  pub email: String,
  pub password_hash: String,
}

impl Store {
  pub fn find_account(&self, email: &str) -> Result<Option<Account>, StoreError> {
    Ok(
      self
        .conn
        .query_row(
          "SELECT email, password_hash FROM accounts WHERE email = ?1",
          params![email.trim().to_lowercase()],
          |row| {
            Ok(Account {
              email: row.get(0)?,
              password_hash: row.get(1)?,
            })
          },
        )
        .optional()?,
    )
  }

  /// Inserts or replaces the account for `account.email`.
  pub fn put_account(&mut self, account: &Account) -> Result<(), StoreError> {
    self.conn.execute(
      "INSERT INTO accounts (email, password_hash, created_at) VALUES (?1, ?2, ?3) \
       ON CONFLICT(email) DO UPDATE SET password_hash = excluded.password_hash",
      params![
        account.email.trim().to_lowercase(),
        account.password_hash,
        time::to_storage(&Utc::now())
      ],
    )?;
    Ok(())
  }
}
