use crate::model::{Answer, Question, QuestionKind};

/// Decoded `application/x-www-form-urlencoded` body. Keys may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First value for `key`, or an empty string.
    pub fn text(&self, key: &str) -> String {
        self.first(key).unwrap_or_default().to_string()
    }

    pub fn all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.first(key).is_some()
    }
}

pub fn field_name(question_id: &str) -> String {
    format!("q_{question_id}")
}

/// Reads the value a respondent gave for `question`. Unanswered questions
/// yield `Text("")` or, for multi-select, `Choices([])`. Values that are not
/// offered by the question are treated as unanswered.
pub fn extract_answer(question: &Question, form: &FormData) -> Answer {
    let name = field_name(&question.id);
    match &question.kind {
        QuestionKind::ShortText => Answer::Text(form.text(&name).trim().to_string()),
        QuestionKind::SingleChoice { .. } | QuestionKind::Dropdown { .. } | QuestionKind::YesNo => {
            let picked = form.text(&name);
            if !picked.is_empty() && question.kind.choice_labels().contains(&picked) {
                Answer::Text(picked)
            } else {
                Answer::Text(String::new())
            }
        }
        QuestionKind::MultiChoice { options } => {
            let mut submitted: Vec<&str> = form.all(&name).collect();
            let mut checked = Vec::new();
            for option in options {
                if let Some(pos) = submitted.iter().position(|value| *value == option.as_str()) {
                    submitted.remove(pos);
                    checked.push(option.clone());
                }
            }
            Answer::Choices(checked)
        }
        QuestionKind::Scale => match form.text(&name).trim().parse::<i64>() {
            Ok(value) if (1..=5).contains(&value) => Answer::Scale(value),
            _ => Answer::Text(String::new()),
        },
    }
}
