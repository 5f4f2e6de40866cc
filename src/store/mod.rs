//! SQLite-backed document store for questions, responses, reports and admin
//! accounts. Every mutation republishes the affected collection on its feed.

mod accounts;
mod questions;
mod reports;
mod responses;
pub mod watch;

use rusqlite::Connection;
use std::path::Path;

use crate::error::StoreError;
use crate::model::{Question, Report, Response};
use watch::{Hub, Subscription};

pub use accounts::Account;

#[derive(Default)]
pub struct Feeds {
  pub questions: Hub<Vec<Question>>,
  pub responses: Hub<Vec<Response>>,
  pub reports: Hub<Vec<Report>>,
  /// Fired once per newly created response, after it is committed.
  pub response_created: Hub<Response>,
}

pub struct Store {
  conn: Connection,
  feeds: Feeds,
}

impl Store {
  pub fn open(path: &Path) -> Result<Self, StoreError> {
    if let Some(parent) = path.parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)
          .map_err(|err| StoreError::InvalidState(format!("{}: {err}", parent.display())))?;
      }
    }
    Self::from_connection(Connection::open(path)?)
  }

  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self, StoreError> {
    Self::from_connection(Connection::open_in_memory()?)
  }

  fn from_connection(conn: Connection) -> Result<Self, StoreError> {
    init_schema(&conn)?;
    Ok(Self {
      conn,
      feeds: Feeds::default(),
    })
  }

  #[cfg(test)]
  pub fn feeds(&self) -> &Feeds {
    &self.feeds
  }

  /// Delivers the current question list immediately, then on every change.
  pub fn watch_questions<F>(&self, mut callback: F) -> Result<Subscription, StoreError>
  where
    F: FnMut(&Vec<Question>) + 'static,
  {
    callback(&self.list_questions()?);
    Ok(self.feeds.questions.subscribe(callback))
  }

  pub fn watch_responses<F>(&self, mut callback: F) -> Result<Subscription, StoreError>
  where
    F: FnMut(&Vec<Response>) + 'static,
  {
    callback(&self.list_responses()?);
    Ok(self.feeds.responses.subscribe(callback))
  }

  pub fn watch_reports<F>(&self, mut callback: F) -> Result<Subscription, StoreError>
  where
    F: FnMut(&Vec<Report>) + 'static,
  {
    callback(&self.list_reports()?);
    Ok(self.feeds.reports.subscribe(callback))
  }

  pub fn on_response_created<F>(&self, callback: F) -> Subscription
  where
    F: FnMut(&Response) + 'static,
  {
    self.feeds.response_created.subscribe(callback)
  }

  fn refresh_questions(&self) {
    if self.feeds.questions.subscriber_count() == 0 {
      return;
    }
    match self.list_questions() {
      Ok(questions) => self.feeds.questions.publish(&questions),
      Err(err) => tracing::warn!(error = %err, "unable to reload questions for subscribers"),
    }
  }

  fn refresh_responses(&self) {
    if self.feeds.responses.subscriber_count() == 0 {
      return;
    }
    match self.list_responses() {
      Ok(responses) => self.feeds.responses.publish(&responses),
      Err(err) => tracing::warn!(error = %err, "unable to reload responses for subscribers"),
    }
  }

  fn refresh_reports(&self) {
    if self.feeds.reports.subscriber_count() == 0 {
      return;
    }
    match self.list_reports() {
      Ok(reports) => self.feeds.reports.publish(&reports),
      Err(err) => tracing::warn!(error = %err, "unable to reload reports for subscribers"),
    }
  }
}

fn init_schema(conn: &Connection) -> Result<(), StoreError> {
  conn.execute_batch(
    "CREATE TABLE IF NOT EXISTS questions (
        id TEXT PRIMARY KEY,
        text TEXT NOT NULL,
        type TEXT NOT NULL,
        required INTEGER NOT NULL,
        options TEXT NOT NULL,
        ord INTEGER NOT NULL,
        created_at TEXT NOT NULL
      );
      CREATE INDEX IF NOT EXISTS idx_questions_ord ON questions(ord);
      CREATE TABLE IF NOT EXISTS responses (
        id TEXT PRIMARY KEY,
        created_at TEXT NOT NULL,
        answers TEXT NOT NULL
      );
      CREATE INDEX IF NOT EXISTS idx_responses_created ON responses(created_at);
      CREATE TABLE IF NOT EXISTS reports (
        id TEXT PRIMARY KEY,
        created_at TEXT NOT NULL,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        reason TEXT NOT NULL,
        description TEXT NOT NULL,
        other_reason TEXT NOT NULL
      );
      CREATE TABLE IF NOT EXISTS accounts (
        email TEXT PRIMARY KEY,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
      );",
  )?;
  Ok(())
}

fn parse_timestamp(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, StoreError> {
  crate::util::time::from_storage(raw)
    .ok_or_else(|| StoreError::InvalidState(format!("bad timestamp '{raw}'")))
}

#[cfg(test)]
mod tests {
  use super::*;
  use uuid::Uuid;

  #[test]
  fn file_store_survives_reopen() {
    let path = std::env::temp_dir()
      .join(format!("survey-store-{}", Uuid::new_v4()))
      .join("survey.sqlite3");
    {
      let mut store = Store::open(&path).expect("open");
      store.seed_defaults_if_empty().expect("seed");
    }
    let store = Store::open(&path).expect("reopen");
    assert_eq!(store.question_count().expect("count"), 12);
    if let Some(dir) = path.parent() {
      let _ = std::fs::remove_dir_all(dir);
    }
  }
}
