use crate::model::{Question, Response};
use crate::util::time;

pub const PLACEHOLDER: &str = "-";
pub const SUBMITTED_HEADER: &str = "Submitted";
pub const TABLE_SEPARATOR: &str = ", ";

/// Header plus one row per response, newest first. A `None` cell is a
/// question the response did not answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl ResponseTable {
    pub fn build(questions: &[Question], responses: &[Response]) -> Self {
        let mut header = Vec::with_capacity(questions.len() + 1);
        header.push(SUBMITTED_HEADER.to_string());
        header.extend(questions.iter().map(|q| q.text.clone()));

        let mut ordered: Vec<&Response> = responses.iter().collect();
        ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let rows = ordered
            .into_iter()
            .map(|response| {
                let mut row = Vec::with_capacity(questions.len() + 1);
                row.push(Some(time::display(&response.created_at)));
                row.extend(questions.iter().map(|question| {
                    response
                        .answer(&question.id)
                        .map(|answer| answer.normalize(TABLE_SEPARATOR))
                }));
                row
            })
            .collect();

        Self { header, rows }
    }

    /// Cells as shown in the dashboard, with the placeholder for gaps.
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.clone().unwrap_or_else(|| PLACEHOLDER.to_string()))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Answer, Answers, QuestionKind};
    use chrono::{TimeZone, Utc};

    fn question(id: &str, text: &str, kind: QuestionKind) -> Question {
        Question {
            id: id.to_string(),
            text: text.to_string(),
            required: false,
            order: 1,
            kind,
        }
    }

    fn response(id: &str, minute: u32, answers: &[(&str, Answer)]) -> Response {
        Response {
            id: id.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
            answers: answers
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<Answers>(),
        }
    }

    #[test]
    fn one_row_per_response_and_one_column_per_question() {
        let questions = vec![
            question("q1", "Pick", QuestionKind::MultiChoice { options: vec![] }),
            question("q2", "Ok?", QuestionKind::YesNo),
        ];
        let responses = vec![
            response(
                "old",
                1,
                &[
                    ("q1", Answer::Choices(vec!["a".to_string(), "b".to_string()])),
                    ("gone", Answer::Text("orphan".to_string())),
                ],
            ),
            response("new", 2, &[("q2", Answer::Flag(true))]),
        ];
        let table = ResponseTable::build(&questions, &responses);

        assert_eq!(table.header, vec!["Submitted", "Pick", "Ok?"]);
        assert_eq!(table.rows.len(), 2);
        assert!(table.rows.iter().all(|row| row.len() == 3));
        assert_eq!(
            table.display_rows(),
            vec![
                vec!["2024-05-01 12:02:00", "-", "Yes"],
                vec!["2024-05-01 12:01:00", "a, b", "-"],
            ]
        );
    }

    #[test]
    fn empty_inputs_give_header_only() {
        let table = ResponseTable::build(&[], &[]);
        assert_eq!(table.header, vec!["Submitted"]);
        assert!(table.rows.is_empty());
    }
}
