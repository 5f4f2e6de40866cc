use crate::error::StoreError;
use crate::model::{Question, QuestionDraft};
use crate::store::Store;

pub const SAVE_FAILED_MESSAGE: &str = "Failed to save question.";
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete question.";
pub const REORDER_FAILED_MESSAGE: &str = "Failed to reorder questions. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            _ => None,
        }
    }
}

/// Creates a question, or rewrites `editing` in place when set.
/// Validation messages are returned as-is; store failures collapse into the
/// generic save message.
pub fn save_question(
    store: &mut Store,
    editing: Option<&str>,
    draft: &QuestionDraft,
) -> Result<Question, String> {
    let fields = draft.validate().map_err(|err| err.to_string())?;
    let saved = match editing {
        Some(id) => store.update_question(id, &fields),
        None => store.create_question(&fields),
    };
    saved.map_err(|err| {
        tracing::error!(error = %err, editing = ?editing, "unable to save question");
        SAVE_FAILED_MESSAGE.to_string()
    })
}

pub fn delete_question(store: &mut Store, id: &str) -> Result<(), String> {
    store.delete_question(id).map_err(|err| {
        tracing::error!(error = %err, id, "unable to delete question");
        DELETE_FAILED_MESSAGE.to_string()
    })
}

/// Swaps `id` with its neighbour in the current order. Moving past either
/// end is a no-op that returns `Ok(false)`.
pub fn move_question(store: &mut Store, id: &str, direction: Direction) -> Result<bool, String> {
    let reorder_failed = |err: StoreError| {
        tracing::error!(error = %err, id, "unable to reorder questions");
        REORDER_FAILED_MESSAGE.to_string()
    };
    let questions = store.list_questions().map_err(reorder_failed)?;
    let Some(index) = questions.iter().position(|q| q.id == id) else {
        return Err(reorder_failed(StoreError::NotFound {
            kind: "question",
            id: id.to_string(),
        }));
    };
    let target = match direction {
        Direction::Up if index > 0 => index - 1,
        Direction::Down if index + 1 < questions.len() => index + 1,
        _ => return Ok(false),
    };
    store
        .swap_order(&questions[index], &questions[target])
        .map_err(reorder_failed)?;
    Ok(true)
}
