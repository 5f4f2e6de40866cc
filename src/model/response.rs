use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A stored answer. Its shape follows the question type at submission time;
/// `Flag` only appears in legacy data and is read as Yes/No.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Flag(bool),
    Scale(i64),
    Text(String),
    Choices(Vec<String>),
}

impl Answer {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(value) => value.is_empty(),
            Self::Choices(values) => values.is_empty(),
            Self::Flag(_) | Self::Scale(_) => false,
        }
    }

    /// Flattens the answer into one cell; sequences are joined with `separator`.
    pub fn normalize(&self, separator: &str) -> String {
        match self {
            Self::Flag(true) => "Yes".to_string(),
            Self::Flag(false) => "No".to_string(),
            Self::Scale(value) => value.to_string(),
            Self::Text(value) => value.clone(),
            Self::Choices(values) => values.join(separator),
        }
    }

    /// The individual values this answer contributes to a chart.
    pub fn chart_values(&self) -> Vec<String> {
        match self {
            Self::Choices(values) => values.clone(),
            other => vec![other.normalize(", ")],
        }
    }
}

/// Question id -> answer. Unanswered questions have no key.
pub type Answers = BTreeMap<String, Answer>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub answers: Answers,
}

impl Response {
    pub fn answer(&self, question_id: &str) -> Option<&Answer> {
        self.answers.get(question_id).filter(|a| !a.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_each_answer_shape() {
        let raw = r#"{"a":"text","b":["x","y"],"c":4,"d":true}"#;
        let answers: Answers = serde_json::from_str(raw).expect("answers");
        assert_eq!(answers["a"], Answer::Text("text".to_string()));
        assert_eq!(
            answers["b"],
            Answer::Choices(vec!["x".to_string(), "y".to_string()])
        );
        assert_eq!(answers["c"], Answer::Scale(4));
        assert_eq!(answers["d"], Answer::Flag(true));
    }

    #[test]
    fn normalize_joins_and_maps_flags() {
        let many = Answer::Choices(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(many.normalize("; "), "a; b");
        assert_eq!(Answer::Flag(false).normalize(", "), "No");
        assert_eq!(Answer::Scale(5).normalize(", "), "5");
    }

    #[test]
    fn empty_answers_read_as_missing() {
        let mut answers = Answers::new();
        answers.insert("q1".to_string(), Answer::Text(String::new()));
        let response = Response {
            id: "r".to_string(),
            created_at: Utc::now(),
            answers,
        };
        assert!(response.answer("q1").is_none());
        assert!(response.answer("q2").is_none());
    }
}
