use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use super::Store;
use crate::error::StoreError;
use crate::model::defaults::default_questions;
use crate::model::{Question, QuestionFields, QuestionKind};
use crate::util::time;

const SELECT_QUESTIONS: &str =
  "SELECT id, text, type, required, options, ord FROM questions ORDER BY ord ASC, rowid ASC";

struct QuestionRow {
  id: String,
  text: String,
  type_tag: String,
  required: bool,
  options: String,
  order: i64,
}

impl QuestionRow {
  fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id: row.get(0)?,
      text: row.get(1)?,
      type_tag: row.get(2)?,
      required: row.get(3)?,
      options: row.get(4)?,
      order: row.get(5)?,
    })
  }

  fn into_question(self) -> Result<Question, StoreError> {
    let options: Vec<String> = serde_json::from_str(&self.options)?;
    let kind = QuestionKind::from_parts(&self.type_tag, options)
      .map_err(|err| StoreError::InvalidState(format!("question {}: {err}", self.id)))?;
    Ok(Question {
      id: self.id,
      text: self.text,
      required: self.required,
      order: self.order,
      kind,
    })
  }
}

fn insert_question(
  conn: &rusqlite::Connection,
  fields: &QuestionFields,
  order: i64,
) -> Result<Question, StoreError> {
  let question = Question {
    id: Uuid::new_v4().to_string(),
    text: fields.text.clone(),
    required: fields.required,
    order,
    kind: fields.kind.clone(),
  };
  conn.execute(
    "INSERT INTO questions (id, text, type, required, options, ord, created_at) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    params![
      question.id,
      question.text,
      question.kind.type_tag(),
      question.required,
      serde_json::to_string(question.kind.options())?,
      question.order,
      time::to_storage(&Utc::now())
    ],
  )?;
  Ok(question)
}

impl Store {
  /// All questions by ascending `order`; equal orders keep insertion order.
  pub fn list_questions(&self) -> Result<Vec<Question>, StoreError> {
    let mut stmt = self.conn.prepare(SELECT_QUESTIONS)?;
    let rows = stmt.query_map([], QuestionRow::from_row)?;
    let mut questions = Vec::new();
    for row in rows {
      questions.push(row?.into_question()?);
    }
    Ok(questions)
  }

  pub fn get_question(&self, id: &str) -> Result<Question, StoreError> {
    let row = self
      .conn
      .query_row(
        "SELECT id, text, type, required, options, ord FROM questions WHERE id = ?1",
        params![id],
        QuestionRow::from_row,
      )
      .optional()?;
    match row {
      Some(row) => row.into_question(),
      None => Err(StoreError::NotFound {
        kind: "question",
        id: id.to_string(),
      }),
    }
  }

  #[cfg(test)]
  pub fn question_count(&self) -> Result<i64, StoreError> {
    Ok(
      self
        .conn
        .query_row("SELECT COUNT(*) FROM questions", [], |row| row.get(0))?,
    )
  }

  /// Appends a question after the current last one.
  pub fn create_question(&mut self, fields: &QuestionFields) -> Result<Question, StoreError> {
    let max: Option<i64> = self
      .conn
      .query_row("SELECT MAX(ord) FROM questions", [], |row| row.get(0))?;
    let question = insert_question(&self.conn, fields, max.unwrap_or(0) + 1)?;
    tracing::info!(id = %question.id, order = question.order, "question created");
    self.refresh_questions();
    Ok(question)
  }

  /// Rewrites text, type, options and required flag. `order` is untouched.
  pub fn update_question(
    &mut self,
    id: &str,
    fields: &QuestionFields,
  ) -> Result<Question, StoreError> {
    let changed = self.conn.execute(
      "UPDATE questions SET text = ?1, type = ?2, required = ?3, options = ?4 WHERE id = ?5",
      params![
        fields.text,
        fields.kind.type_tag(),
        fields.required,
        serde_json::to_string(fields.kind.options())?,
        id
      ],
    )?;
    if changed == 0 {
      return Err(StoreError::NotFound {
        kind: "question",
        id: id.to_string(),
      });
    }
    tracing::info!(id, "question updated");
    self.refresh_questions();
    self.get_question(id)
  }

  /// Removes the question only; stored answers keyed by it are left in place.
  pub fn delete_question(&mut self, id: &str) -> Result<(), StoreError> {
    let changed = self
      .conn
      .execute("DELETE FROM questions WHERE id = ?1", params![id])?;
    if changed == 0 {
      return Err(StoreError::NotFound {
        kind: "question",
        id: id.to_string(),
      });
    }
    tracing::info!(id, "question deleted");
    self.refresh_questions();
    Ok(())
  }

  /// Exchanges the `order` of two questions in one transaction. Each update is
  /// conditioned on the order the caller observed; if either misses, nothing
  /// is written.
  pub fn swap_order(&mut self, first: &Question, second: &Question) -> Result<(), StoreError> {
    let tx = self.conn.transaction()?;
    for (target, observed, next) in [
      (first, first.order, second.order),
      (second, second.order, first.order),
    ] {
      let changed = tx.execute(
        "UPDATE questions SET ord = ?1 WHERE id = ?2 AND ord = ?3",
        params![next, target.id, observed],
      )?;
      if changed != 1 {
        // Dropping `tx` rolls back the first update.
        return Err(StoreError::SwapRejected(format!(
          "question {} no longer has order {observed}",
          target.id
        )));
      }
    }
    tx.commit()?;
    tracing::info!(first = %first.id, second = %second.id, "question order swapped");
    self.refresh_questions();
    Ok(())
  }

  /// Writes the default question set if, and only if, no question exists.
  /// Returns whether anything was written.
  pub fn seed_defaults_if_empty(&mut self) -> Result<bool, StoreError> {
    let tx = self.conn.transaction()?;
    let count: i64 = tx.query_row("SELECT COUNT(*) FROM questions", [], |row| row.get(0))?;
    if count > 0 {
      return Ok(false);
    }
    let defaults = default_questions();
    for (index, fields) in defaults.iter().enumerate() {
      insert_question(&tx, fields, index as i64 + 1)?;
    }
    tx.commit()?;
    tracing::info!(count = defaults.len(), "seeded default questions");
    self.refresh_questions();
    Ok(true)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::RefCell;
  use std::rc::Rc;

  fn fields(text: &str, kind: QuestionKind) -> QuestionFields {
    QuestionFields {
      text: text.to_string(),
      required: false,
      kind,
    }
  }

  #[test]
  fn create_appends_after_max_order() {
    let mut store = Store::open_in_memory().expect("store");
    let a = store.create_question(&fields("A", QuestionKind::YesNo)).expect("a");
    let b = store.create_question(&fields("B", QuestionKind::Scale)).expect("b");
    assert_eq!((a.order, b.order), (1, 2));

    store.delete_question(&a.id).expect("delete");
    let c = store.create_question(&fields("C", QuestionKind::ShortText)).expect("c");
    assert_eq!(c.order, 3);
  }

  #[test]
  fn update_keeps_order_and_replaces_kind() {
    let mut store = Store::open_in_memory().expect("store");
    store.create_question(&fields("A", QuestionKind::YesNo)).expect("a");
    let b = store.create_question(&fields("B", QuestionKind::YesNo)).expect("b");
    let updated = store
      .update_question(
        &b.id,
        &fields(
          "B2",
          QuestionKind::Dropdown {
            options: vec!["x".to_string()],
          },
        ),
      )
      .expect("update");
    assert_eq!(updated.order, 2);
    assert_eq!(updated.text, "B2");
    assert_eq!(updated.kind.options(), &["x".to_string()]);
  }

  #[test]
  fn equal_orders_fall_back_to_insertion() {
    let store = Store::open_in_memory().expect("store");
    for text in ["first", "second"] {
      insert_question(&store.conn, &fields(text, QuestionKind::YesNo), 5).expect("insert");
    }
    let texts: Vec<String> = store
      .list_questions()
      .expect("list")
      .into_iter()
      .map(|q| q.text)
      .collect();
    assert_eq!(texts, vec!["first", "second"]);
  }

  #[test]
  fn swap_exchanges_only_the_pair() {
    let mut store = Store::open_in_memory().expect("store");
    let a = store.create_question(&fields("A", QuestionKind::YesNo)).expect("a");
    let b = store.create_question(&fields("B", QuestionKind::YesNo)).expect("b");
    let c = store.create_question(&fields("C", QuestionKind::YesNo)).expect("c");

    store.swap_order(&a, &b).expect("swap");
    let orders: Vec<(String, i64)> = store
      .list_questions()
      .expect("list")
      .into_iter()
      .map(|q| (q.text, q.order))
      .collect();
    assert_eq!(
      orders,
      vec![
        ("B".to_string(), 1),
        ("A".to_string(), 2),
        ("C".to_string(), c.order)
      ]
    );
  }

  #[test]
  fn failed_swap_changes_neither_question() {
    let mut store = Store::open_in_memory().expect("store");
    let a = store.create_question(&fields("A", QuestionKind::YesNo)).expect("a");
    let b = store.create_question(&fields("B", QuestionKind::YesNo)).expect("b");
    store.delete_question(&b.id).expect("delete");

    let err = store.swap_order(&a, &b).expect_err("rejected");
    assert!(matches!(err, StoreError::SwapRejected(_)));
    assert_eq!(store.get_question(&a.id).expect("a").order, 1);
  }

  #[test]
  fn stale_order_rejects_swap() {
    let mut store = Store::open_in_memory().expect("store");
    let a = store.create_question(&fields("A", QuestionKind::YesNo)).expect("a");
    let b = store.create_question(&fields("B", QuestionKind::YesNo)).expect("b");
    let mut stale_b = b.clone();
    stale_b.order = 9;

    assert!(store.swap_order(&a, &stale_b).is_err());
    assert_eq!(store.get_question(&a.id).expect("a").order, 1);
    assert_eq!(store.get_question(&b.id).expect("b").order, 2);
  }

  #[test]
  fn seeding_happens_once() {
    let mut store = Store::open_in_memory().expect("store");
    assert!(store.seed_defaults_if_empty().expect("seed"));
    assert!(!store.seed_defaults_if_empty().expect("seed again"));
    let questions = store.list_questions().expect("list");
    assert_eq!(questions.len(), 12);
    assert!(questions.iter().all(Question::is_well_formed));
    assert_eq!(questions[0].order, 1);
    assert_eq!(questions[11].order, 12);
  }

  #[test]
  fn seeding_skips_non_empty_set() {
    let mut store = Store::open_in_memory().expect("store");
    store.create_question(&fields("Mine", QuestionKind::YesNo)).expect("q");
    assert!(!store.seed_defaults_if_empty().expect("seed"));
    assert_eq!(store.question_count().expect("count"), 1);
  }

  #[test]
  fn subscribers_receive_full_snapshots() {
    let mut store = Store::open_in_memory().expect("store");
    let sizes = Rc::new(RefCell::new(Vec::new()));
    let sink = sizes.clone();
    let _sub = store
      .watch_questions(move |questions| sink.borrow_mut().push(questions.len()))
      .expect("watch");

    let a = store.create_question(&fields("A", QuestionKind::YesNo)).expect("a");
    store.create_question(&fields("B", QuestionKind::YesNo)).expect("b");
    store.delete_question(&a.id).expect("delete");
    assert_eq!(*sizes.borrow(), vec![0, 1, 2, 1]);
  }

  #[test]
  fn missing_question_is_not_found() {
    let mut store = Store::open_in_memory().expect("store");
    assert!(matches!(
      store.get_question("nope"),
      Err(StoreError::NotFound { .. })
    ));
    assert!(store.delete_question("nope").is_err());
  }
}
