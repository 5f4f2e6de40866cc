use serde::Serialize;

use super::extract::field_name;
use super::submit::Extraction;
use crate::model::{Answer, Question, QuestionKind};

pub const SELECT_PLACEHOLDER: &str = "Select an option";
pub const TEXT_PLACEHOLDER: &str = "Your response";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceView {
    pub value: String,
    pub checked: bool,
}

/// Template input for one question's control group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView {
    pub id: String,
    pub name: String,
    pub label: String,
    pub required: bool,
    pub control: &'static str,
    pub choices: Vec<ChoiceView>,
    pub value: String,
    pub answered: bool,
    pub placeholder: Option<&'static str>,
    pub error: Option<&'static str>,
}

pub fn question_label(position: usize, question: &Question) -> String {
    let marker = if question.required { " *" } else { "" };
    format!("{}. {}{}", position, question.text, marker)
}

fn control_for(kind: &QuestionKind) -> &'static str {
    match kind {
        QuestionKind::ShortText => "text",
        QuestionKind::SingleChoice { .. } | QuestionKind::YesNo => "radio",
        QuestionKind::Dropdown { .. } => "select",
        QuestionKind::MultiChoice { .. } => "checkbox",
        QuestionKind::Scale => "scale",
    }
}

fn choices_for(kind: &QuestionKind, previous: Option<&Answer>) -> Vec<ChoiceView> {
    let picked: Vec<String> = match previous {
        Some(Answer::Choices(values)) => values.clone(),
        Some(answer) if !answer.is_empty() => vec![answer.normalize(", ")],
        _ => Vec::new(),
    };
    kind.choice_labels()
        .into_iter()
        .map(|value| ChoiceView {
            checked: picked.contains(&value),
            value,
        })
        .collect()
}

/// Builds control groups in question order. `previous` re-fills the values a
/// respondent already entered when the form comes back with errors.
pub fn field_views(questions: &[Question], previous: Option<&Extraction>) -> Vec<FieldView> {
    questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let answer = previous.and_then(|p| p.value(&question.id));
            let value = match (&question.kind, answer) {
                (QuestionKind::ShortText, Some(answer)) => answer.normalize(", "),
                _ => String::new(),
            };
            FieldView {
                id: question.id.clone(),
                name: field_name(&question.id),
                label: question_label(index + 1, question),
                required: question.required,
                control: control_for(&question.kind),
                choices: choices_for(&question.kind, answer),
                answered: answer.is_some_and(|a| !a.is_empty()),
                value,
                placeholder: match question.kind {
                    QuestionKind::ShortText => Some(TEXT_PLACEHOLDER),
                    QuestionKind::Dropdown { .. } => Some(SELECT_PLACEHOLDER),
                    _ => None,
                },
                error: previous.and_then(|p| p.errors.get(&question.id).copied()),
            }
        })
        .collect()
}
