use super::client::{GoogleSheets, SheetTarget};
use crate::aggregate::table::SUBMITTED_HEADER;
use crate::error::SyncError;
use crate::model::{Question, Response};
use crate::settings::SheetCredentials;
use crate::store::Store;
use crate::util::time;

pub const SHEET_SEPARATOR: &str = "; ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Credentials are incomplete; nothing was sent.
    Skipped,
    Appended { header_written: bool },
}

pub fn header_row(questions: &[Question]) -> Vec<String> {
    std::iter::once(SUBMITTED_HEADER.to_string())
        .chain(questions.iter().map(|q| q.text.clone()))
        .collect()
}

pub fn sheet_row(questions: &[Question], response: &Response) -> Vec<String> {
    std::iter::once(time::iso_millis(&response.created_at))
        .chain(questions.iter().map(|question| {
            response
                .answer(&question.id)
                .map(|answer| answer.normalize(SHEET_SEPARATOR))
                .unwrap_or_default()
        }))
        .collect()
}

/// Rewrites the first row unless it already equals `header`. A failed read
/// counts as a mismatch.
pub fn ensure_header(target: &mut dyn SheetTarget, header: &[String]) -> Result<bool, SyncError> {
    let existing = match target.read_header() {
        Ok(existing) => existing,
        Err(err) => {
            tracing::warn!(error = %err, "header read failed, writing header");
            Vec::new()
        }
    };
    if existing.as_slice() == header {
        return Ok(false);
    }
    target.write_header(header)?;
    Ok(true)
}

pub fn sync_response(
    target: &mut dyn SheetTarget,
    questions: &[Question],
    response: &Response,
) -> Result<SyncStatus, SyncError> {
    let header_written = ensure_header(target, &header_row(questions))?;
    target.append_row(&sheet_row(questions, response))?;
    Ok(SyncStatus::Appended { header_written })
}

/// One sync invocation for a created response. Reads the questions fresh and
/// builds its own client; nothing is shared between invocations.
pub fn run_sync(
    store: &Store,
    credentials: Option<&SheetCredentials>,
    response_id: &str,
) -> Result<SyncStatus, SyncError> {
    let Some(credentials) = credentials else {
        tracing::error!(
            response = response_id,
            "sheet credentials missing (spreadsheet id, client email, private key); skipping sync"
        );
        return Ok(SyncStatus::Skipped);
    };
    let response = store.get_response(response_id)?;
    let questions = store.list_questions()?;
    let mut sheets = GoogleSheets::new(credentials.clone())?;
    let status = sync_response(&mut sheets, &questions, &response)?;
    tracing::info!(response = response_id, ?status, "response mirrored to sheet");
    Ok(status)
}


#[cfg(test)]
mod tests {
    use super::fake::MemorySheet;
    use super::*;
    use crate::model::{Answer, Answers, QuestionKind};
    use chrono::{TimeZone, Utc};

    fn questions() -> Vec<Question> {
        vec![
            Question {
                id: "q1".to_string(),
                text: "Features".to_string(),
                required: true,
                order: 1,
                kind: QuestionKind::MultiChoice {
                    options: vec!["a".to_string(), "b".to_string()],
                },
            },
            Question {
                id: "q2".to_string(),
                text: "Ok?".to_string(),
                required: false,
                order: 2,
                kind: QuestionKind::YesNo,
            },
            Question {
                id: "q3".to_string(),
                text: "Rate".to_string(),
                required: false,
                order: 3,
                kind: QuestionKind::Scale,
            },
        ]
    }

    fn response() -> Response {
        let mut answers = Answers::new();
        answers.insert(
            "q1".to_string(),
            Answer::Choices(vec!["a".to_string(), "b".to_string()]),
        );
        answers.insert("q2".to_string(), Answer::Flag(false));
        Response {
            id: "r1".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            answers,
        }
    }

    #[test]
    fn row_uses_iso_time_and_semicolon_joins() {
        assert_eq!(
            sheet_row(&questions(), &response()),
            vec!["2024-01-02T03:04:05.000Z", "a; b", "No", ""]
        );
    }

    #[test]
    fn header_is_written_once_then_rows_append() {
        let mut sheet = MemorySheet::default();
        let first = sync_response(&mut sheet, &questions(), &response()).expect("first");
        let second = sync_response(&mut sheet, &questions(), &response()).expect("second");

        assert_eq!(first, SyncStatus::Appended { header_written: true });
        assert_eq!(second, SyncStatus::Appended { header_written: false });
        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.rows[0], vec!["Submitted", "Features", "Ok?", "Rate"]);
    }

    #[test]
    fn changed_questions_overwrite_header() {
        let mut sheet = MemorySheet {
            rows: vec![vec!["Submitted".to_string(), "Old".to_string()]],
            ..MemorySheet::default()
        };
        sync_response(&mut sheet, &questions(), &response()).expect("sync");
        assert_eq!(sheet.rows[0][1], "Features");
        assert_eq!(sheet.rows.len(), 2);
    }

    #[test]
    fn unreadable_header_is_treated_as_different() {
        let mut sheet = MemorySheet {
            rows: vec![header_row(&questions())],
            fail_reads: true,
            ..MemorySheet::default()
        };
        let status = sync_response(&mut sheet, &questions(), &response()).expect("sync");
        assert_eq!(status, SyncStatus::Appended { header_written: true });
        assert_eq!(sheet.header_writes, 1);
    }

    #[test]
    fn append_failure_is_reported() {
        let mut sheet = MemorySheet {
            fail_appends: true,
            ..MemorySheet::default()
        };
        assert!(sync_response(&mut sheet, &questions(), &response()).is_err());
    }

    #[test]
    fn missing_credentials_skip_without_error() {
        let store = Store::open_in_memory().expect("store");
        let status = run_sync(&store, None, "whatever").expect("skip");
        assert_eq!(status, SyncStatus::Skipped);
    }
}
