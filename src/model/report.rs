use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const REPORT_SAVED_MESSAGE: &str =
    "Your report has been saved and will be reviewed after verification.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportReason {
    Spam,
    Harassment,
    #[serde(rename = "Inappropriate content")]
    InappropriateContent,
    #[serde(rename = "Misleading information")]
    MisleadingInformation,
    #[serde(rename = "Privacy concern")]
    PrivacyConcern,
    Other,
}

impl ReportReason {
    pub const ALL: [ReportReason; 6] = [
        Self::Spam,
        Self::Harassment,
        Self::InappropriateContent,
        Self::MisleadingInformation,
        Self::PrivacyConcern,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spam => "Spam",
            Self::Harassment => "Harassment",
            Self::InappropriateContent => "Inappropriate content",
            Self::MisleadingInformation => "Misleading information",
            Self::PrivacyConcern => "Privacy concern",
            Self::Other => "Other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == value.trim())
    }
}

/// Abuse/feedback report. Unrelated to survey content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub reason: ReportReason,
    pub description: String,
    /// Empty unless `reason` is `Other`.
    pub other_reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub other_reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFields {
    pub name: String,
    pub email: String,
    pub reason: ReportReason,
    pub description: String,
    pub other_reason: String,
}

impl ReportDraft {
    pub fn validate(&self) -> Result<ReportFields, ValidationError> {
        let name = self.name.trim();
        let email = self.email.trim();
        let description = self.description.trim();
        let other_reason = self.other_reason.trim();
        let reason = ReportReason::parse(&self.reason);

        let Some(reason) = reason.filter(|_| {
            !name.is_empty() && !email.is_empty() && !description.is_empty()
        }) else {
            return Err(ValidationError::IncompleteReport);
        };

        if reason == ReportReason::Other && other_reason.is_empty() {
            return Err(ValidationError::MissingOtherReason);
        }

        Ok(ReportFields {
            name: name.to_string(),
            email: email.to_string(),
            reason,
            description: description.to_string(),
            other_reason: if reason == ReportReason::Other {
                other_reason.to_string()
            } else {
                String::new()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(reason: &str, other: &str) -> ReportDraft {
        ReportDraft {
            name: " Ada ".to_string(),
            email: "ada@example.com".to_string(),
            reason: reason.to_string(),
            description: "Something happened".to_string(),
            other_reason: other.to_string(),
        }
    }

    #[test]
    fn other_reason_is_cleared_for_listed_reasons() {
        let fields = draft("Spam", "leftover").validate().expect("valid");
        assert_eq!(fields.name, "Ada");
        assert_eq!(fields.reason, ReportReason::Spam);
        assert_eq!(fields.other_reason, "");
    }

    #[test]
    fn other_requires_description_of_reason() {
        let err = draft("Other", "  ").validate().expect_err("invalid");
        assert_eq!(err, ValidationError::MissingOtherReason);
        let ok = draft("Other", " custom ").validate().expect("valid");
        assert_eq!(ok.other_reason, "custom");
    }

    #[test]
    fn missing_fields_are_reported_before_other_reason() {
        let mut d = draft("Other", "");
        d.description = "   ".to_string();
        assert_eq!(d.validate().expect_err("invalid"), ValidationError::IncompleteReport);
        assert_eq!(
            draft("", "").validate().expect_err("invalid"),
            ValidationError::IncompleteReport
        );
    }

    #[test]
    fn reason_serializes_as_display_text() {
        let json = serde_json::to_string(&ReportReason::InappropriateContent).expect("json");
        assert_eq!(json, "\"Inappropriate content\"");
    }
}
