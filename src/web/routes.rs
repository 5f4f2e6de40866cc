use chrono::Utc;
use regex::Regex;
use std::sync::mpsc::Sender;
use std::sync::OnceLock;
use tera::Context;

use super::reply::Reply;
use super::request::{Incoming, Method};
use crate::admin::dashboard::EditorView;
use crate::admin::editor::{self, Direction};
use crate::admin::{Auth, Dashboard};
use crate::aggregate::csv::NO_QUESTIONS_MESSAGE;
use crate::aggregate::{export_csv, ResponseTable};
use crate::error::{AuthError, WebError};
use crate::form::render::{field_views, FieldView};
use crate::form::submit::{
    submit_report, submit_response, ReportOutcome, INCOMPLETE_MESSAGE, REPORT_FAILED_MESSAGE,
    SUBMIT_FAILED_MESSAGE,
};
use crate::form::{SubmissionGuard, SubmitOutcome};
use crate::model::report::REPORT_SAVED_MESSAGE;
use crate::model::{Question, QuestionDraft, ReportDraft, ReportReason};
use crate::render::templates::Pages;
use crate::settings::Settings;
use crate::store::watch::Subscription;
use crate::store::Store;
use crate::util::time;

pub const CONFIG_MESSAGE: &str =
    "Survey storage is not configured. Check the data directory and database settings.";
pub const LOAD_FAILED_MESSAGE: &str = "Unable to load the survey. Please try again later.";
pub const ADMIN_COOKIE: &str = "survey_admin";
const COMPLETION_COOKIE_ATTRS: &str = "Path=/; Max-Age=315360000; SameSite=Lax";
const ADMIN_COOKIE_ATTRS: &str = "Path=/admin; HttpOnly; SameSite=Strict";

fn question_action_route() -> &'static Regex {
    static ROUTE: OnceLock<Regex> = OnceLock::new();
    ROUTE.get_or_init(|| {
        Regex::new(r"^/admin/questions/([^/]+)/(up|down|delete)$").expect("regex")
    })
}

fn chart_route() -> &'static Regex {
    static ROUTE: OnceLock<Regex> = OnceLock::new();
    ROUTE.get_or_init(|| Regex::new(r"^/admin/charts/([^/]+)\.svg$").expect("regex"))
}

/// Everything the single-threaded server loop owns.
pub struct App {
    settings: Settings,
    /// `None` when the database could not be opened; pages then show
    /// [`CONFIG_MESSAGE`] and accept no submissions.
    store: Option<Store>,
    pages: Pages,
    guard: SubmissionGuard,
    auth: Auth,
    dashboard: Dashboard,
    sync_feed: Option<Subscription>,
}

impl App {
    pub fn new(settings: Settings, store: Option<Store>, pages: Pages) -> Self {
        let auth = Auth::new(settings.admin_allow_list());
        Self {
            settings,
            store,
            pages,
            guard: SubmissionGuard::default(),
            auth,
            dashboard: Dashboard::default(),
            sync_feed: None,
        }
    }

    /// Forwards every created response id to the sync worker.
    pub fn attach_sync(&mut self, sender: Sender<String>) {
        if let Some(store) = &self.store {
            self.sync_feed = Some(store.on_response_created(move |response| {
                if sender.send(response.id.clone()).is_err() {
                    tracing::error!(response = %response.id, "sync worker unavailable");
                }
            }));
        }
    }

    pub fn handle(&mut self, req: &Incoming) -> Reply {
        match self.route(req) {
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!(path = %req.path, error = %err, "request failed");
                Reply::text(500, "Something went wrong. Please try again.")
            }
        }
    }

    fn route(&mut self, req: &Incoming) -> Result<Reply, WebError> {
        match (req.method, req.path.as_str()) {
            (Method::Get, "/") => self.survey_page(req),
            (Method::Post, "/submit") => self.submit(req),
            (Method::Get, "/report") => self.report_page(&ReportDraft::default(), None, None),
            (Method::Post, "/report") => self.report(req),
            (Method::Get, "/admin") => self.admin_page(req),
            (Method::Post, "/admin/login") => self.login(req),
            (Method::Post, "/admin/logout") => Ok(self.logout(req)),
            (Method::Post, "/admin/questions") => self.save_question(req),
            (Method::Get, "/admin/export.csv") => self.export(req),
            (Method::Get, "/admin/revision") => Ok(self.revision(req)),
            (method, path) => self.dynamic_route(method, path, req),
        }
    }

    fn dynamic_route(&mut self, method: Method, path: &str, req: &Incoming) -> Result<Reply, WebError> {
        if method == Method::Post {
            if let Some(caps) = question_action_route().captures(path) {
                let id = caps[1].to_string();
                let action = caps[2].to_string();
                return self.question_action(req, &id, &action);
            }
        }
        if method == Method::Get {
            if let Some(caps) = chart_route().captures(path) {
                return Ok(self.chart(req, &caps[1]));
            }
        }
        Ok(Reply::not_found())
    }

    // Respondent pages

    fn render_survey(
        &self,
        fields: &[FieldView],
        token: &str,
        submitted: bool,
        form_error: Option<&str>,
        config_error: Option<&str>,
    ) -> Result<Reply, WebError> {
        let mut ctx = Context::new();
        ctx.insert("fields", fields);
        ctx.insert("token", token);
        ctx.insert("submitted", &submitted);
        ctx.insert("form_error", &form_error);
        ctx.insert("config_error", &config_error);
        Ok(Reply::html(self.pages.render("survey.html", &ctx)?))
    }

    fn thank_you(&self) -> Result<Reply, WebError> {
        Ok(self
            .render_survey(&[], "", true, None, None)?
            .set_cookie(&self.settings.completion_cookie, "true", COMPLETION_COOKIE_ATTRS))
    }

    fn survey_questions(&self) -> Result<Vec<Question>, &'static str> {
        let Some(store) = &self.store else {
            return Err(CONFIG_MESSAGE);
        };
        match store.list_questions() {
            Ok(questions) => Ok(questions.into_iter().filter(Question::is_well_formed).collect()),
            Err(err) => {
                tracing::error!(error = %err, "unable to load questions");
                Err(LOAD_FAILED_MESSAGE)
            }
        }
    }

    fn survey_page(&mut self, req: &Incoming) -> Result<Reply, WebError> {
        if req.cookie(&self.settings.completion_cookie) == Some("true") {
            return self.render_survey(&[], "", true, None, None);
        }
        match self.survey_questions() {
            Ok(questions) => {
                let token = self.guard.issue();
                self.render_survey(&field_views(&questions, None), &token, false, None, None)
            }
            Err(message) => self.render_survey(&[], "", false, None, Some(message)),
        }
    }

    fn submit(&mut self, req: &Incoming) -> Result<Reply, WebError> {
        let questions = match self.survey_questions() {
            Ok(questions) => questions,
            Err(message) => return self.render_survey(&[], "", false, None, Some(message)),
        };
        let Some(store) = self.store.as_mut() else {
            return self.render_survey(&[], "", false, None, Some(CONFIG_MESSAGE));
        };
        let token = req.form.text("token");
        let outcome = submit_response(store, &mut self.guard, &questions, &token, &req.form);

        let (extraction, message) = match outcome {
            SubmitOutcome::Saved(response) => {
                tracing::debug!(response_id = %response.id, "survey response accepted");
                return self.thank_you();
            }
            SubmitOutcome::Duplicate => return self.thank_you(),
            SubmitOutcome::Invalid(extraction) => (extraction, INCOMPLETE_MESSAGE),
            SubmitOutcome::Failed(extraction) => (extraction, SUBMIT_FAILED_MESSAGE),
        };
        let fields = field_views(&questions, Some(&extraction));
        let token = if self.guard.begin(&token).is_ok() {
            self.guard.release(&token);
            token
        } else {
            self.guard.issue()
        };
        Ok(self
            .render_survey(&fields, &token, false, Some(message), None)?
            .status(422))
    }

    fn report_page(
        &self,
        draft: &ReportDraft,
        toast: Option<&str>,
        error: Option<String>,
    ) -> Result<Reply, WebError> {
        let reasons: Vec<&str> = ReportReason::ALL.iter().map(|r| r.as_str()).collect();
        let mut ctx = Context::new();
        ctx.insert("draft", draft);
        ctx.insert("reasons", &reasons);
        ctx.insert("toast", &toast);
        ctx.insert("error", &error);
        ctx.insert(
            "config_error",
            &self.store.is_none().then_some(CONFIG_MESSAGE),
        );
        Ok(Reply::html(self.pages.render("report.html", &ctx)?))
    }

    fn report(&mut self, req: &Incoming) -> Result<Reply, WebError> {
        let draft = ReportDraft {
            name: req.form.text("name"),
            email: req.form.text("email"),
            reason: req.form.text("reason"),
            description: req.form.text("description"),
            other_reason: req.form.text("otherReason"),
        };
        let Some(store) = self.store.as_mut() else {
            return self.report_page(&draft, None, None);
        };
        match submit_report(store, &draft) {
            ReportOutcome::Saved(report) => {
                tracing::debug!(report_id = %report.id, "report accepted");
                self.report_page(&ReportDraft::default(), Some(REPORT_SAVED_MESSAGE), None)
            }
            ReportOutcome::Invalid(err) => Ok(self
                .report_page(&draft, None, Some(err.to_string()))?
                .status(422)),
            ReportOutcome::Failed => Ok(self
                .report_page(&draft, None, Some(REPORT_FAILED_MESSAGE.to_string()))?
                .status(500)),
        }
    }

    // Admin pages

    fn admin_email(&self, req: &Incoming) -> Option<String> {
        let token = req.cookie(ADMIN_COOKIE)?;
        self.auth.session(token).ok().map(|s| s.email.clone())
    }

    fn login_page(&self, email: &str, error: Option<String>) -> Result<Reply, WebError> {
        let mut ctx = Context::new();
        ctx.insert("email", email);
        ctx.insert("error", &error);
        ctx.insert(
            "config_error",
            &self.store.is_none().then_some(CONFIG_MESSAGE),
        );
        Ok(Reply::html(self.pages.render("admin_login.html", &ctx)?))
    }

    fn render_dashboard(
        &self,
        email: &str,
        editor: EditorView,
        notice: Option<&str>,
    ) -> Result<Reply, WebError> {
        let view = self.dashboard.state().view(editor);
        let mut ctx = Context::new();
        ctx.insert("view", &view);
        ctx.insert("admin_email", email);
        ctx.insert("notice", &notice);
        Ok(Reply::html(self.pages.render("dashboard.html", &ctx)?))
    }

    fn editing_question(&self, id: Option<&str>) -> Option<Question> {
        let id = id.filter(|id| !id.is_empty())?;
        self.dashboard
            .state()
            .questions
            .iter()
            .find(|q| q.id == id)
            .cloned()
    }

    fn admin_page(&mut self, req: &Incoming) -> Result<Reply, WebError> {
        let Some(email) = self.admin_email(req) else {
            return self.login_page("", None);
        };
        let editor = match self.editing_question(req.query.first("edit")) {
            Some(question) => EditorView::for_question(&question),
            None => EditorView::blank(),
        };
        self.render_dashboard(&email, editor, None)
    }

    fn login(&mut self, req: &Incoming) -> Result<Reply, WebError> {
        let email = req.form.text("email");
        let password = req.form.text("password");
        let Some(store) = self.store.as_mut() else {
            return self.login_page(&email, None);
        };
        match self.auth.sign_in(store, &email, &password) {
            Ok(token) => {
                if let Err(err) = self.dashboard.activate(store) {
                    tracing::error!(error = %err, "unable to start dashboard listeners");
                }
                Ok(Reply::redirect("/admin").set_cookie(ADMIN_COOKIE, &token, ADMIN_COOKIE_ATTRS))
            }
            Err(AuthError::Store(err)) => {
                tracing::error!(error = %err, "sign-in lookup failed");
                self.login_page(&email, Some(AuthError::InvalidCredentials.to_string()))
            }
            Err(err) => Ok(self.login_page(&email, Some(err.to_string()))?.status(401)),
        }
    }

    fn logout(&mut self, req: &Incoming) -> Reply {
        if let Some(token) = req.cookie(ADMIN_COOKIE) {
            self.auth.sign_out(token);
        }
        Reply::redirect("/admin").set_cookie(ADMIN_COOKIE, "", "Path=/admin; Max-Age=0")
    }

    fn save_question(&mut self, req: &Incoming) -> Result<Reply, WebError> {
        let Some(email) = self.admin_email(req) else {
            return Ok(Reply::redirect("/admin"));
        };
        let draft = QuestionDraft {
            text: req.form.text("text"),
            type_tag: req.form.text("type"),
            options_raw: req.form.text("options"),
            required: req.form.has("required"),
        };
        let editing = req.form.first("editing").filter(|id| !id.is_empty());
        let Some(store) = self.store.as_mut() else {
            return self.login_page(&email, None);
        };
        match editor::save_question(store, editing, &draft) {
            Ok(_) => Ok(Reply::redirect("/admin")),
            Err(message) => {
                let editing = self.editing_question(editing);
                let editor = EditorView::rejected(editing.as_ref(), &draft, message);
                Ok(self.render_dashboard(&email, editor, None)?.status(422))
            }
        }
    }

    fn question_action(&mut self, req: &Incoming, id: &str, action: &str) -> Result<Reply, WebError> {
        let Some(email) = self.admin_email(req) else {
            return Ok(Reply::redirect("/admin"));
        };
        let Some(store) = self.store.as_mut() else {
            return self.login_page(&email, None);
        };
        let result = match Direction::parse(action) {
            Some(direction) => editor::move_question(store, id, direction).map(|_| ()),
            None => editor::delete_question(store, id),
        };
        match result {
            Ok(()) => Ok(Reply::redirect("/admin")),
            Err(message) => self.render_dashboard(&email, EditorView::blank(), Some(&message)),
        }
    }

    fn export(&mut self, req: &Incoming) -> Result<Reply, WebError> {
        let Some(email) = self.admin_email(req) else {
            return Ok(Reply::redirect("/admin"));
        };
        let Some(store) = &self.store else {
            return self.login_page(&email, None);
        };
        let questions = store.list_questions()?;
        if questions.is_empty() {
            return self.render_dashboard(&email, EditorView::blank(), Some(NO_QUESTIONS_MESSAGE));
        }
        let responses = store.list_responses()?;
        let csv = export_csv(&ResponseTable::build(&questions, &responses));
        tracing::info!(rows = responses.len(), "csv export");
        Ok(Reply::csv(&time::csv_filename(&Utc::now()), csv))
    }

    fn revision(&self, req: &Incoming) -> Reply {
        if self.admin_email(req).is_none() {
            return Reply::text(401, "");
        }
        Reply::text(200, self.dashboard.state().revision.to_string())
    }

    fn chart(&self, req: &Incoming, question_id: &str) -> Reply {
        if self.admin_email(req).is_none() {
            return Reply::text(401, "");
        }
        match self.dashboard.state().charts.get(question_id) {
            Some(handle) => Reply::svg(handle.svg.clone()),
            None => Reply::not_found(),
        }
    }
}
