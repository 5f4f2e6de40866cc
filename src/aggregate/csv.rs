use super::table::ResponseTable;

pub const NO_QUESTIONS_MESSAGE: &str = "No questions available to export.";

/// Quotes a field when it contains a quote, comma or line break.
pub fn csv_field(value: &str) -> String {
    if value.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line<'a, I>(cells: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    cells.into_iter().map(csv_field).collect::<Vec<_>>().join(",")
}

/// Same header and rows as the dashboard table; unanswered cells are empty.
pub fn export_csv(table: &ResponseTable) -> String {
    let mut lines = Vec::with_capacity(table.rows.len() + 1);
    lines.push(csv_line(table.header.iter().map(String::as_str)));
    for row in &table.rows {
        lines.push(csv_line(row.iter().map(|cell| cell.as_deref().unwrap_or(""))));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::chart::chart_series;
    use crate::aggregate::table::ResponseTable;
    use crate::model::{Answer, Question, QuestionKind, Response};
    use chrono::{TimeZone, Utc};

    /// Minimal RFC 4180 reader used to check the writer.
    fn parse_csv(text: &str) -> Vec<Vec<String>> {
        let mut rows = vec![Vec::new()];
        let mut field = String::new();
        let mut quoted = false;
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            match (quoted, c) {
                (true, '"') if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                (true, '"') => quoted = false,
                (true, c) => field.push(c),
                (false, '"') => quoted = true,
                (false, ',') => rows.last_mut().unwrap().push(std::mem::take(&mut field)),
                (false, '\n') => {
                    rows.last_mut().unwrap().push(std::mem::take(&mut field));
                    rows.push(Vec::new());
                }
                (false, c) => field.push(c),
            }
        }
        rows.last_mut().unwrap().push(field);
        rows
    }

    #[test]
    fn quotes_only_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn parsed_export_matches_table() {
        let questions = vec![Question {
            id: "q1".to_string(),
            text: "Tricky, \"header\"".to_string(),
            required: false,
            order: 1,
            kind: QuestionKind::ShortText,
        }];
        let responses = vec![
            Response {
                id: "r1".to_string(),
                created_at: Utc::now(),
                answers: [("q1".to_string(), Answer::Text("line\nbreak, comma".to_string()))]
                    .into_iter()
                    .collect(),
            },
            Response {
                id: "r2".to_string(),
                created_at: Utc::now() - chrono::Duration::minutes(1),
                answers: Default::default(),
            },
        ];
        let table = ResponseTable::build(&questions, &responses);
        let parsed = parse_csv(&export_csv(&table));

        assert_eq!(parsed[0], table.header);
        assert_eq!(parsed.len(), 3);
        for (parsed_row, row) in parsed[1..].iter().zip(&table.rows) {
            let expected: Vec<String> = row.iter().map(|c| c.clone().unwrap_or_default()).collect();
            assert_eq!(parsed_row, &expected);
        }
        assert_eq!(parsed[2][1], "");
    }

    #[test]
    fn yes_no_survey_exports_every_response() {
        let questions = vec![Question {
            id: "q1".to_string(),
            text: "Attended?".to_string(),
            required: false,
            order: 1,
            kind: QuestionKind::YesNo,
        }];
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let responses: Vec<Response> = [Some("Yes"), Some("Yes"), Some("No"), None]
            .into_iter()
            .enumerate()
            .map(|(idx, answer)| Response {
                id: format!("r{idx}"),
                created_at: start - chrono::Duration::minutes(idx as i64),
                answers: answer
                    .map(|value| ("q1".to_string(), Answer::Text(value.to_string())))
                    .into_iter()
                    .collect(),
            })
            .collect();

        let csv = export_csv(&ResponseTable::build(&questions, &responses));
        assert_eq!(
            csv.lines().collect::<Vec<_>>(),
            vec![
                "Submitted,Attended?",
                "2024-06-01 09:00:00,Yes",
                "2024-06-01 08:59:00,Yes",
                "2024-06-01 08:58:00,No",
                "2024-06-01 08:57:00,",
            ]
        );

        let series = chart_series(&questions[0], &responses);
        assert_eq!(series.labels, vec!["Yes", "No"]);
        assert_eq!(series.data, vec![2, 1]);
    }
}
