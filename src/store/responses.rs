use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use super::{parse_timestamp, Store};
use crate::error::StoreError;
use crate::model::{Answers, Response};
use crate::util::time;

fn decode(id: String, created_at: String, answers: String) -> Result<Response, StoreError> {
  Ok(Response {
    id,
    created_at: parse_timestamp(&created_at)?,
    answers: serde_json::from_str(&answers)?,
  })
}

impl Store {
  /// Persists a response with a store-assigned id and timestamp, then
  /// notifies creation listeners with the committed record.
  pub fn create_response(&mut self, answers: Answers) -> Result<Response, StoreError> {
    let response = Response {
      id: Uuid::new_v4().to_string(),
      created_at: Utc::now(),
      answers,
    };
    self.conn.execute(
      "INSERT INTO responses (id, created_at, answers) VALUES (?1, ?2, ?3)",
      params![
        response.id,
        time::to_storage(&response.created_at),
        serde_json::to_string(&response.answers)?
      ],
    )?;
    tracing::info!(id = %response.id, answers = response.answers.len(), "response stored");
    self.feeds.response_created.publish(&response);
    self.refresh_responses();
    Ok(response)
  }

  /// Newest first.
  pub fn list_responses(&self) -> Result<Vec<Response>, StoreError> {
    let mut stmt = self.conn.prepare(
      "SELECT id, created_at, answers FROM responses ORDER BY created_at DESC, rowid DESC",
    )?;
    let rows = stmt.query_map([], |row| {
      Ok((
        row.get::<_, String>(0)?,
        row.get::<_, String>(1)?,
        row.get::<_, String>(2)?,
      ))
    })?;
    let mut responses = Vec::new();
    for row in rows {
      let (id, created_at, answers) = row?;
      responses.push(decode(id, created_at, answers)?);
    }
    Ok(responses)
  }

  pub fn get_response(&self, id: &str) -> Result<Response, StoreError> {
    let row: Option<(String, String, String)> = self
      .conn
      .query_row(
        "SELECT id, created_at, answers FROM responses WHERE id = ?1",
        params![id],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
      )
      .optional()?;
    match row {
      Some((id, created_at, answers)) => decode(id, created_at, answers),
      None => Err(StoreError::NotFound {
        kind: "response",
        id: id.to_string(),
      }),
    }
  }

  #[cfg(test)]
  pub fn response_count(&self) -> Result<i64, StoreError> {
    Ok(
      self
        .conn
        .query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?,
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::Answer;
  use std::cell::RefCell;
  use std::rc::Rc;

  fn answers(pairs: &[(&str, Answer)]) -> Answers {
    pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.clone()))
      .collect()
  }

  #[test]
  fn responses_list_newest_first() {
    let mut store = Store::open_in_memory().expect("store");
    let first = store
      .create_response(answers(&[("q1", Answer::Text("one".to_string()))]))
      .expect("first");
    let second = store
      .create_response(answers(&[("q1", Answer::Scale(3))]))
      .expect("second");

    let ids: Vec<String> = store
      .list_responses()
      .expect("list")
      .into_iter()
      .map(|r| r.id)
      .collect();
    assert_eq!(ids, vec![second.id, first.id.clone()]);
    assert_eq!(store.get_response(&first.id).expect("get"), first);
  }

  #[test]
  fn creation_listeners_see_committed_response() {
    let mut store = Store::open_in_memory().expect("store");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let _sub = store.on_response_created(move |response| sink.borrow_mut().push(response.id.clone()));

    let created = store.create_response(Answers::new()).expect("create");
    assert_eq!(*seen.borrow(), vec![created.id]);
    assert_eq!(store.response_count().expect("count"), 1);
  }

  #[test]
  fn unknown_response_is_not_found() {
    let store = Store::open_in_memory().expect("store");
    assert!(matches!(
      store.get_response("missing"),
      Err(StoreError::NotFound { kind: "response", .. })
    ));
  }
}
