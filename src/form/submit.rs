use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use super::extract::{extract_answer, FormData};
use crate::error::{GuardError, ValidationError};
use crate::model::{Answer, Answers, Question, Report, ReportDraft, Response};
use crate::store::Store;

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const INCOMPLETE_MESSAGE: &str = "Please complete all required fields.";
pub const SUBMIT_FAILED_MESSAGE: &str = "Submission failed. Please try again.";
pub const REPORT_FAILED_MESSAGE: &str = "Failed to submit report. Please try again.";

const TOKEN_TTL_HOURS: i64 = 24;
const MAX_TOKENS: usize = 10_000;

/// Question id -> inline error message.
pub type FieldErrors = BTreeMap<String, &'static str>;

/// Every question's extracted value, in render order, plus any field errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub values: Vec<(String, Answer)>,
    pub errors: FieldErrors,
}

impl Extraction {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn value(&self, question_id: &str) -> Option<&Answer> {
        self.values
            .iter()
            .find(|(id, _)| id == question_id)
            .map(|(_, answer)| answer)
    }

    /// The answers that get stored: empty values are omitted.
    pub fn answers(&self) -> Answers {
        self.values
            .iter()
            .filter(|(_, answer)| !answer.is_empty())
            .map(|(id, answer)| (id.clone(), answer.clone()))
            .collect()
    }
}

/// Checks every question; a required question left empty is flagged without
/// stopping at the first one.
pub fn validate_submission(questions: &[Question], form: &FormData) -> Extraction {
    let mut extraction = Extraction::default();
    for question in questions {
        let answer = extract_answer(question, form);
        if question.required && answer.is_empty() {
            extraction.errors.insert(question.id.clone(), REQUIRED_MESSAGE);
        }
        extraction.values.push((question.id.clone(), answer));
    }
    extraction
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenState {
    Ready,
    InFlight,
    Consumed,
}

#[derive(Debug)]
struct TokenEntry {
    state: TokenState,
    issued: DateTime<Utc>,
    seq: u64,
}

/// One-time tokens embedded in each rendered form. A token is held while its
/// write runs, consumed on success and released on failure.
///
/// At most `limit` tokens are kept; issuing past that forgets the oldest one
/// that is not in flight.
#[derive(Debug)]
pub struct SubmissionGuard {
    tokens: HashMap<String, TokenEntry>,
    limit: usize,
    next_seq: u64,
}

impl Default for SubmissionGuard {
    fn default() -> Self {
        Self::with_limit(MAX_TOKENS)
    }
}

impl SubmissionGuard {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            tokens: HashMap::new(),
            limit: limit.max(1),
            next_seq: 0,
        }
    }

    pub fn issue(&mut self) -> String {
        let now = Utc::now();
        self.prune(now);
        while self.tokens.len() >= self.limit && self.evict_oldest() {}

        let token = Uuid::new_v4().to_string();
        self.tokens.insert(
            token.clone(),
            TokenEntry {
                state: TokenState::Ready,
                issued: now,
                seq: self.next_seq,
            },
        );
        self.next_seq += 1;
        token
    }

    pub fn begin(&mut self, token: &str) -> Result<(), GuardError> {
        let Some(entry) = self.tokens.get_mut(token) else {
            return Err(GuardError::Unknown);
        };
        match entry.state {
            TokenState::InFlight => Err(GuardError::InFlight),
            TokenState::Consumed => Err(GuardError::Consumed),
            TokenState::Ready => {
                entry.state = TokenState::InFlight;
                Ok(())
            }
        }
    }

    pub fn complete(&mut self, token: &str) {
        if let Some(entry) = self.tokens.get_mut(token) {
            entry.state = TokenState::Consumed;
        }
    }

    pub fn release(&mut self, token: &str) {
        if let Some(entry) = self.tokens.get_mut(token) {
            if entry.state == TokenState::InFlight {
                entry.state = TokenState::Ready;
            }
        }
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::hours(TOKEN_TTL_HOURS);
        self.tokens.retain(|_, entry| entry.issued > cutoff);
    }

    fn evict_oldest(&mut self) -> bool {
        let oldest = self
            .tokens
            .iter()
            .filter(|(_, entry)| entry.state != TokenState::InFlight)
            .min_by_key(|(_, entry)| entry.seq)
            .map(|(token, _)| token.clone());
        match oldest {
            Some(token) => {
                self.tokens.remove(&token);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Saved(Response),
    Invalid(Extraction),
    /// The write or token admission failed; the form may be retried.
    Failed(Extraction),
    /// The token was already used successfully.
    Duplicate,
}

pub fn submit_response(
    store: &mut Store,
    guard: &mut SubmissionGuard,
    questions: &[Question],
    token: &str,
    form: &FormData,
) -> SubmitOutcome {
    let extraction = validate_submission(questions, form);
    match guard.begin(token) {
        Ok(()) => {}
        Err(GuardError::Consumed) | Err(GuardError::InFlight) => {
            tracing::warn!("duplicate survey submission ignored");
            return SubmitOutcome::Duplicate;
        }
        Err(err) => {
            tracing::warn!(error = %err, "survey submission rejected");
            return SubmitOutcome::Failed(extraction);
        }
    }

    if !extraction.is_valid() {
        guard.release(token);
        return SubmitOutcome::Invalid(extraction);
    }

    match store.create_response(extraction.answers()) {
        Ok(response) => {
            guard.complete(token);
            SubmitOutcome::Saved(response)
        }
        Err(err) => {
            tracing::error!(error = %err, "unable to store survey response");
            guard.release(token);
            SubmitOutcome::Failed(extraction)
        }
    }
}

#[derive(Debug)]
pub enum ReportOutcome {
    Saved(Report),
    Invalid(ValidationError),
    Failed,
}

pub fn submit_report(store: &mut Store, draft: &ReportDraft) -> ReportOutcome {
    let fields = match draft.validate() {
        Ok(fields) => fields,
        Err(err) => return ReportOutcome::Invalid(err),
    };
    match store.create_report(&fields) {
        Ok(report) => ReportOutcome::Saved(report),
        Err(err) => {
            tracing::error!(error = %err, "unable to store report");
            ReportOutcome::Failed
        }
    }
}
