use serde::Serialize;

use crate::model::{Question, QuestionKind, Response};

pub const TOP_TEXT_VALUES: usize = 5;
pub const OTHER_LABEL: &str = "Other";
pub const NO_RESPONSES_LABEL: &str = "No responses";
pub const PIE_MAX_BUCKETS: usize = 5;

pub const PALETTE: [&str; 9] = [
    "#2563eb", "#38bdf8", "#14b8a6", "#f59e0b", "#ef4444", "#a855f7", "#22c55e", "#f97316",
    "#64748b",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub question_id: String,
    pub title: String,
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub data: Vec<u64>,
    pub colors: Vec<&'static str>,
}

impl ChartSeries {
    pub fn total(&self) -> u64 {
        self.data.iter().sum()
    }
}

pub fn chart_kind(kind: &QuestionKind, bucket_count: usize) -> ChartKind {
    match kind {
        QuestionKind::YesNo => ChartKind::Pie,
        QuestionKind::SingleChoice { .. } | QuestionKind::Dropdown { .. }
            if bucket_count <= PIE_MAX_BUCKETS =>
        {
            ChartKind::Pie
        }
        _ => ChartKind::Bar,
    }
}

pub fn colors_for(count: usize) -> Vec<&'static str> {
    (0..count).map(|idx| PALETTE[idx % PALETTE.len()]).collect()
}

/// Ordered label -> count tally. Labels keep first-insertion order.
#[derive(Debug, Default)]
struct Tally {
    buckets: Vec<(String, u64)>,
}

impl Tally {
    fn seeded(labels: Vec<String>) -> Self {
        let mut tally = Self::default();
        for label in labels {
            if !tally.buckets.iter().any(|(existing, _)| *existing == label) {
                tally.buckets.push((label, 0));
            }
        }
        tally
    }

    fn add(&mut self, label: String) {
        match self.buckets.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, count)) => *count += 1,
            None => self.buckets.push((label, 1)),
        }
    }
}

/// Keeps the `keep` most frequent entries and folds the rest into "Other".
/// Ties keep first-seen order.
fn compress(mut buckets: Vec<(String, u64)>, keep: usize) -> Vec<(String, u64)> {
    buckets.sort_by(|a, b| b.1.cmp(&a.1));
    let mut rest = buckets.split_off(buckets.len().min(keep));
    if !rest.is_empty() {
        let other: u64 = rest.drain(..).map(|(_, count)| count).sum();
        buckets.push((OTHER_LABEL.to_string(), other));
    }
    if buckets.is_empty() {
        buckets.push((NO_RESPONSES_LABEL.to_string(), 0));
    }
    buckets
}

pub fn chart_series(question: &Question, responses: &[Response]) -> ChartSeries {
    let values = responses
        .iter()
        .filter_map(|response| response.answer(&question.id))
        .flat_map(|answer| answer.chart_values());

    let buckets = match &question.kind {
        QuestionKind::ShortText => {
            let mut tally = Tally::default();
            for value in values {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    tally.add(trimmed.to_string());
                }
            }
            compress(tally.buckets, TOP_TEXT_VALUES)
        }
        kind => {
            let mut tally = Tally::seeded(kind.choice_labels());
            for value in values {
                tally.add(value);
            }
            tally.buckets
        }
    };

    let (labels, data): (Vec<String>, Vec<u64>) = buckets.into_iter().unzip();
    ChartSeries {
        question_id: question.id.clone(),
        title: question.text.clone(),
        kind: chart_kind(&question.kind, labels.len()),
        colors: colors_for(labels.len()),
        labels,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Answer, Answers};
    use chrono::Utc;

    fn question(kind: QuestionKind) -> Question {
        Question {
            id: "q1".to_string(),
            text: "Q".to_string(),
            required: true,
            order: 1,
            kind,
        }
    }

    fn responses(answers: Vec<Option<Answer>>) -> Vec<Response> {
        answers
            .into_iter()
            .enumerate()
            .map(|(idx, answer)| {
                let mut map = Answers::new();
                if let Some(answer) = answer {
                    map.insert("q1".to_string(), answer);
                }
                Response {
                    id: format!("r{idx}"),
                    created_at: Utc::now(),
                    answers: map,
                }
            })
            .collect()
    }

    fn text(value: &str) -> Option<Answer> {
        Some(Answer::Text(value.to_string()))
    }

    #[test]
    fn yes_no_counts_with_fixed_buckets() {
        let series = chart_series(
            &question(QuestionKind::YesNo),
            &responses(vec![text("Yes"), text("Yes"), text("No"), None]),
        );
        assert_eq!(series.labels, vec!["Yes", "No"]);
        assert_eq!(series.data, vec![2, 1]);
        assert_eq!(series.kind, ChartKind::Pie);
    }

    #[test]
    fn scale_buckets_start_at_zero() {
        let series = chart_series(
            &question(QuestionKind::Scale),
            &responses(vec![Some(Answer::Scale(4)), Some(Answer::Scale(4))]),
        );
        assert_eq!(series.labels, vec!["1", "2", "3", "4", "5"]);
        assert_eq!(series.data, vec![0, 0, 0, 2, 0]);
        assert_eq!(series.kind, ChartKind::Bar);
    }

    #[test]
    fn multi_choice_counts_every_selection() {
        let kind = QuestionKind::MultiChoice {
            options: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        };
        let pick = |values: &[&str]| {
            Some(Answer::Choices(values.iter().map(|v| v.to_string()).collect()))
        };
        let series = chart_series(
            &question(kind),
            &responses(vec![pick(&["a", "b"]), pick(&["b", "c"]), pick(&["b"])]),
        );
        assert_eq!(series.data, vec![1, 3, 1]);
        assert_eq!(series.total(), 5);
    }

    #[test]
    fn retired_choice_values_get_their_own_bucket() {
        let kind = QuestionKind::SingleChoice {
            options: vec!["a".to_string()],
        };
        let series = chart_series(&question(kind), &responses(vec![text("a"), text("old")]));
        assert_eq!(series.labels, vec!["a", "old"]);
        assert_eq!(series.data, vec![1, 1]);
    }

    #[test]
    fn pie_only_for_small_single_value_choices() {
        let six: Vec<String> = (1..=6).map(|n| n.to_string()).collect();
        assert_eq!(
            chart_kind(&QuestionKind::Dropdown { options: six.clone() }, 6),
            ChartKind::Bar
        );
        assert_eq!(
            chart_kind(&QuestionKind::SingleChoice { options: six }, 5),
            ChartKind::Pie
        );
        assert_eq!(
            chart_kind(&QuestionKind::MultiChoice { options: vec![] }, 2),
            ChartKind::Bar
        );
    }

    #[test]
    fn short_text_keeps_top_five_and_folds_the_rest() {
        let answers = ["a", "a", "a", "b", "b", "c", "d", "e", "f", " g ", "g", "h"]
            .iter()
            .map(|v| text(v))
            .chain([text("   ")])
            .collect();
        let series = chart_series(&question(QuestionKind::ShortText), &responses(answers));
        assert_eq!(series.labels, vec!["a", "b", "g", "c", "d", "Other"]);
        assert_eq!(series.data, vec![3, 2, 2, 1, 1, 3]);
        assert!(series.labels.len() <= 6);
        assert_eq!(series.total(), 12);
    }

    #[test]
    fn short_text_without_answers() {
        let series = chart_series(&question(QuestionKind::ShortText), &responses(vec![None]));
        assert_eq!(series.labels, vec!["No responses"]);
        assert_eq!(series.data, vec![0]);
    }

    #[test]
    fn palette_cycles() {
        let colors = colors_for(11);
        assert_eq!(colors[9], PALETTE[0]);
        assert_eq!(colors[10], PALETTE[1]);
    }
}
