use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const YES_NO_LABELS: [&str; 2] = ["Yes", "No"];
pub const SCALE_LABELS: [&str; 5] = ["1", "2", "3", "4", "5"];

/// The six supported question types. Only the choice variants carry options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    ShortText,
    SingleChoice { options: Vec<String> },
    Dropdown { options: Vec<String> },
    MultiChoice { options: Vec<String> },
    YesNo,
    #[serde(rename = "scale_1_5")]
    Scale,
}

impl QuestionKind {
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::ShortText => "short_text",
            Self::SingleChoice { .. } => "single_choice",
            Self::Dropdown { .. } => "dropdown",
            Self::MultiChoice { .. } => "multi_choice",
            Self::YesNo => "yes_no",
            Self::Scale => "scale_1_5",
        }
    }

    /// Badge text shown next to a question in the admin list.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ShortText => "Short text",
            Self::SingleChoice { .. } => "Single choice",
            Self::Dropdown { .. } => "Dropdown",
            Self::MultiChoice { .. } => "Multi select",
            Self::YesNo => "Yes/No",
            Self::Scale => "Scale 1-5",
        }
    }

    /// Admin-authored options; empty for every non-choice type.
    pub fn options(&self) -> &[String] {
        match self {
            Self::SingleChoice { options }
            | Self::Dropdown { options }
            | Self::MultiChoice { options } => options,
            Self::ShortText | Self::YesNo | Self::Scale => &[],
        }
    }

    /// Every value a respondent can pick, including the fixed Yes/No and 1-5 sets.
    pub fn choice_labels(&self) -> Vec<String> {
        match self {
            Self::ShortText => Vec::new(),
            Self::SingleChoice { options }
            | Self::Dropdown { options }
            | Self::MultiChoice { options } => options.clone(),
            Self::YesNo => YES_NO_LABELS.iter().map(|v| v.to_string()).collect(),
            Self::Scale => SCALE_LABELS.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn needs_options(type_tag: &str) -> bool {
        matches!(type_tag, "single_choice" | "multi_choice" | "dropdown")
    }

    /// Rebuilds a kind from its stored tag. Options are dropped for non-choice types.
    pub fn from_parts(type_tag: &str, options: Vec<String>) -> Result<Self, ValidationError> {
        match type_tag {
            "short_text" => Ok(Self::ShortText),
            "single_choice" => Ok(Self::SingleChoice { options }),
            "dropdown" => Ok(Self::Dropdown { options }),
            "multi_choice" => Ok(Self::MultiChoice { options }),
            "yes_no" => Ok(Self::YesNo),
            "scale_1_5" => Ok(Self::Scale),
            other => Err(ValidationError::UnknownQuestionType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    pub required: bool,
    pub order: i64,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

impl Question {
    pub fn is_well_formed(&self) -> bool {
        if self.text.trim().is_empty() {
            return false;
        }
        match &self.kind {
            QuestionKind::SingleChoice { options }
            | QuestionKind::Dropdown { options }
            | QuestionKind::MultiChoice { options } => {
                !options.is_empty() && options.iter().all(|o| !o.trim().is_empty())
            }
            QuestionKind::ShortText | QuestionKind::YesNo | QuestionKind::Scale => true,
        }
    }
}

/// Raw editor input, as typed by an admin.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub text: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default)]
    pub options_raw: String,
    #[serde(default)]
    pub required: bool,
}

/// A draft that passed validation; carries no id and no order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionFields {
    pub text: String,
    pub required: bool,
    pub kind: QuestionKind,
}

impl QuestionDraft {
    pub fn validate(&self) -> Result<QuestionFields, ValidationError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(ValidationError::MissingQuestionText);
        }
        let options = if QuestionKind::needs_options(&self.type_tag) {
            parse_options(&self.options_raw)
        } else {
            Vec::new()
        };
        let kind = QuestionKind::from_parts(&self.type_tag, options)?;
        if QuestionKind::needs_options(&self.type_tag) && kind.options().is_empty() {
            return Err(ValidationError::MissingOptions);
        }
        Ok(QuestionFields {
            text: text.to_string(),
            required: self.required,
            kind,
        })
    }
}

/// One option per line, trimmed, blank lines dropped. Duplicates are kept.
pub fn parse_options(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Inverse of [`parse_options`], used to pre-fill the editor.
pub fn options_to_raw(kind: &QuestionKind) -> String {
    kind.options().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(type_tag: &str, text: &str, options_raw: &str) -> QuestionDraft {
        QuestionDraft {
            text: text.to_string(),
            type_tag: type_tag.to_string(),
            options_raw: options_raw.to_string(),
            required: true,
        }
    }

    #[test]
    fn choice_draft_trims_options_and_keeps_duplicates() {
        let fields = draft("multi_choice", "  Pick  ", " A \n\nB\nA\n   \n")
            .validate()
            .expect("valid");
        assert_eq!(fields.text, "Pick");
        assert_eq!(
            fields.kind,
            QuestionKind::MultiChoice {
                options: vec!["A".to_string(), "B".to_string(), "A".to_string()]
            }
        );
    }

    #[test]
    fn choice_draft_without_options_is_rejected() {
        let err = draft("dropdown", "Pick", "\n  \n").validate().expect_err("invalid");
        assert_eq!(err.to_string(), "Please provide at least one option.");
    }

    #[test]
    fn blank_text_is_rejected_before_options() {
        let err = draft("dropdown", "   ", "").validate().expect_err("invalid");
        assert_eq!(err.to_string(), "Question text is required.");
    }

    #[test]
    fn non_choice_types_discard_options() {
        let fields = draft("yes_no", "Ok?", "Yes\nNo").validate().expect("valid");
        assert_eq!(fields.kind, QuestionKind::YesNo);
        assert!(fields.kind.options().is_empty());
        assert_eq!(fields.kind.choice_labels(), vec!["Yes", "No"]);
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(draft("matrix", "Grid", "").validate().is_err());
    }

    #[test]
    fn serde_uses_flat_type_tag() {
        let q = Question {
            id: "q1".to_string(),
            text: "Rate".to_string(),
            required: false,
            order: 3,
            kind: QuestionKind::Scale,
        };
        let json = serde_json::to_value(&q).expect("json");
        assert_eq!(json["type"], "scale_1_5");
        let back: Question = serde_json::from_value(json).expect("parse");
        assert_eq!(back, q);
    }

    #[test]
    fn well_formed_requires_non_blank_options() {
        let q = Question {
            id: "q".to_string(),
            text: "T".to_string(),
            required: true,
            order: 1,
            kind: QuestionKind::SingleChoice {
                options: vec!["a".to_string(), " ".to_string()],
            },
        };
        assert!(!q.is_well_formed());
    }
}
