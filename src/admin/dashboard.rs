//! Admin dashboard state. Each subscription delivery replaces one collection
//! wholesale and rebuilds whatever depends on it; chart drawings are released
//! before new ones are made.

use serde::Serialize;
use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::aggregate::svg::render_svg;
use crate::aggregate::{chart_series, ChartSeries, ResponseTable};
use crate::error::StoreError;
use crate::model::question::options_to_raw;
use crate::model::{Question, QuestionDraft, QuestionKind, Report, Response};
use crate::store::watch::Subscription;
use crate::store::Store;
use crate::util::time;

pub const NO_CHART_RESPONSES: &str = "No responses yet.";

/// A drawn chart owned by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartHandle {
    pub id: u64,
    pub series: ChartSeries,
    pub svg: String,
}

#[derive(Debug, Default)]
pub struct ChartRegistry {
    handles: BTreeMap<String, ChartHandle>,
    next_id: u64,
    released: u64,
}

impl ChartRegistry {
    pub fn release_all(&mut self) {
        self.released += self.handles.len() as u64;
        self.handles.clear();
    }

    pub fn create(&mut self, series: ChartSeries) -> u64 {
        self.next_id += 1;
        let handle = ChartHandle {
            id: self.next_id,
            svg: render_svg(&series),
            series,
        };
        let id = handle.id;
        if let Some(previous) = self.handles.insert(handle.series.question_id.clone(), handle) {
            tracing::debug!(chart = previous.id, "replaced chart handle");
            self.released += 1;
        }
        id
    }

    pub fn get(&self, question_id: &str) -> Option<&ChartHandle> {
        self.handles.get(question_id)
    }

    pub fn live(&self) -> usize {
        self.handles.len()
    }

    pub fn created(&self) -> u64 {
        self.next_id
    }

    pub fn released(&self) -> u64 {
        self.released
    }
}

#[derive(Debug, Default)]
pub struct DashboardState {
    pub questions: Vec<Question>,
    pub responses: Vec<Response>,
    pub reports: Vec<Report>,
    pub charts: ChartRegistry,
    /// Bumped on every delivery; pages poll it to know when to reload.
    pub revision: u64,
}

impl DashboardState {
    pub fn replace_questions(&mut self, questions: &[Question]) {
        self.questions = questions.to_vec();
        self.rebuild_charts();
        self.revision += 1;
    }

    pub fn replace_responses(&mut self, responses: &[Response]) {
        self.responses = responses.to_vec();
        self.rebuild_charts();
        self.revision += 1;
    }

    pub fn replace_reports(&mut self, reports: &[Report]) {
        self.reports = reports.to_vec();
        self.revision += 1;
    }

    fn rebuild_charts(&mut self) {
        self.charts.release_all();
        if self.responses.is_empty() {
            return;
        }
        for question in &self.questions {
            self.charts.create(chart_series(question, &self.responses));
        }
        tracing::debug!(
            live = self.charts.live(),
            created = self.charts.created(),
            released = self.charts.released(),
            "charts rebuilt"
        );
    }

    pub fn table(&self) -> ResponseTable {
        ResponseTable::build(&self.questions, &self.responses)
    }

    pub fn view(&self, editor: EditorView) -> DashboardView {
        let last = self.questions.len().saturating_sub(1);
        let questions = self
            .questions
            .iter()
            .enumerate()
            .map(|(index, question)| QuestionItem {
                id: question.id.clone(),
                text: question.text.clone(),
                badge: format!(
                    "{}{}",
                    question.kind.label(),
                    if question.required { " · required" } else { "" }
                ),
                up_disabled: index == 0,
                down_disabled: index == last,
            })
            .collect();

        let charts = self
            .questions
            .iter()
            .map(|question| {
                let handle = self.charts.get(&question.id);
                ChartCard {
                    title: question.text.clone(),
                    svg: handle.map(|h| h.svg.clone()),
                    handle: handle.map(|h| h.id),
                    empty_message: handle.is_none().then_some(NO_CHART_RESPONSES),
                }
            })
            .collect();

        let table = self.table();
        let reports = self
            .reports
            .iter()
            .enumerate()
            .map(|(index, report)| {
                let dash = |value: &str| {
                    if value.is_empty() {
                        "-".to_string()
                    } else {
                        value.to_string()
                    }
                };
                vec![
                    (index + 1).to_string(),
                    time::display(&report.created_at),
                    dash(&report.name),
                    dash(&report.email),
                    report.reason.as_str().to_string(),
                    dash(&report.description),
                    dash(&report.other_reason),
                ]
            })
            .collect::<Vec<_>>();

        DashboardView {
            total_questions: self.questions.len(),
            total_responses: self.responses.len(),
            questions,
            charts,
            table_header: table.header.clone(),
            table_rows: table.display_rows(),
            report_count_label: format!(
                "{} report{}",
                reports.len(),
                if reports.len() == 1 { "" } else { "s" }
            ),
            reports,
            editor,
            revision: self.revision,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionItem {
    pub id: String,
    pub text: String,
    pub badge: String,
    pub up_disabled: bool,
    pub down_disabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartCard {
    pub title: String,
    pub svg: Option<String>,
    pub handle: Option<u64>,
    pub empty_message: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

const TYPE_CHOICES: [(&str, &str); 6] = [
    ("short_text", "Short text"),
    ("single_choice", "Single choice"),
    ("dropdown", "Dropdown"),
    ("multi_choice", "Multi select"),
    ("yes_no", "Yes/No"),
    ("scale_1_5", "Scale 1-5"),
];

/// The question editor form.
#[derive(Debug, Clone, Serialize)]
pub struct EditorView {
    pub editing_id: Option<String>,
    pub indicator: Option<String>,
    pub text: String,
    pub options_raw: String,
    pub options_enabled: bool,
    pub required: bool,
    pub submit_label: &'static str,
    pub error: Option<String>,
    pub types: Vec<TypeOption>,
}

impl EditorView {
    fn build(editing: Option<&Question>, text: String, type_tag: &str, options_raw: String, required: bool) -> Self {
        let options_enabled = QuestionKind::needs_options(type_tag);
        Self {
            editing_id: editing.map(|q| q.id.clone()),
            indicator: editing.map(|q| format!("Editing question: {}", q.text)),
            text,
            options_raw: if options_enabled { options_raw } else { String::new() },
            options_enabled,
            required,
            submit_label: if editing.is_some() { "Update question" } else { "Add question" },
            error: None,
            types: TYPE_CHOICES
                .iter()
                .map(|&(value, label)| TypeOption {
                    value,
                    label,
                    selected: value == type_tag,
                })
                .collect(),
        }
    }

    pub fn blank() -> Self {
        Self::build(None, String::new(), "short_text", String::new(), true)
    }

    pub fn for_question(question: &Question) -> Self {
        Self::build(
            Some(question),
            question.text.clone(),
            question.kind.type_tag(),
            options_to_raw(&question.kind),
            question.required,
        )
    }

    /// Re-displays a rejected draft with its error.
    pub fn rejected(editing: Option<&Question>, draft: &QuestionDraft, error: String) -> Self {
        let mut view = Self::build(
            editing,
            draft.text.clone(),
            &draft.type_tag,
            draft.options_raw.clone(),
            draft.required,
        );
        view.error = Some(error);
        view
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub total_questions: usize,
    pub total_responses: usize,
    pub questions: Vec<QuestionItem>,
    pub charts: Vec<ChartCard>,
    pub table_header: Vec<String>,
    pub table_rows: Vec<Vec<String>>,
    pub reports: Vec<Vec<String>>,
    pub report_count_label: String,
    pub editor: EditorView,
    pub revision: u64,
}

/// Owns the dashboard state and the store subscriptions that feed it.
#[derive(Default)]
pub struct Dashboard {
    state: Rc<RefCell<DashboardState>>,
    subscriptions: Vec<Subscription>,
}

impl Dashboard {
    pub fn is_live(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Runs once per process, on the first admin session: seeds the default
    /// questions when none exist, then starts the three listeners.
    pub fn activate(&mut self, store: &mut Store) -> Result<(), StoreError> {
        if self.is_live() {
            return Ok(());
        }
        if store.seed_defaults_if_empty()? {
            tracing::info!("question set was empty; defaults seeded");
        }

        let state = Rc::clone(&self.state);
        let questions = store.watch_questions(move |q| state.borrow_mut().replace_questions(q))?;
        let state = Rc::clone(&self.state);
        let responses = store.watch_responses(move |r| state.borrow_mut().replace_responses(r))?;
        let state = Rc::clone(&self.state);
        let reports = store.watch_reports(move |r| state.borrow_mut().replace_reports(r))?;

        self.subscriptions = vec![questions, responses, reports];
        tracing::info!("dashboard listeners started");
        Ok(())
    }

    pub fn state(&self) -> Ref<'_, DashboardState> {
        self.state.borrow()
    }
}
