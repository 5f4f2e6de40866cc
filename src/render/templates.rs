use tera::{Context, Tera};

use crate::error::WebError;

/// Page templates, compiled into the binary. Names end in `.html` so tera
/// autoescapes every interpolation.
const PAGES: &[(&str, &str)] = &[
  ("base.html", include_str!("../../templates/base.html")),
  ("survey.html", include_str!("../../templates/survey.html")),
  ("report.html", include_str!("../../templates/report.html")),
  ("admin_login.html", include_str!("../../templates/admin_login.html")),
  ("dashboard.html", include_str!("../../templates/dashboard.html")),
];

pub struct Pages {
  tera: Tera,
}

impl Pages {
  pub fn load() -> Result<Self, WebError> {
    let mut tera = Tera::default();
    tera.add_raw_templates(PAGES.iter().copied())?;
    Ok(Self { tera })
  }

  pub fn render(&self, name: &str, ctx: &Context) -> Result<String, WebError> {
    Ok(self.tera.render(name, ctx)?)
  }
}

#[cfg(test)]
mod tests {
  use super::Pages;
  use crate::admin::dashboard::{DashboardState, EditorView};
  use crate::form::render::field_views;
  use crate::model::{Question, QuestionKind, ReportDraft, ReportReason};
  use tera::Context;

  fn survey_context() -> Context {
    let mut ctx = Context::new();
    ctx.insert("config_error", &None::<String>);
    ctx.insert("submitted", &false);
    ctx.insert("token", "tok");
    ctx.insert("form_error", &None::<String>);
    ctx
  }

  #[test]
  fn survey_page_escapes_question_text() {
    let pages = Pages::load().expect("templates");
    let questions = vec![Question {
      id: "q1".to_string(),
      text: "<script>alert(1)</script>".to_string(),
      required: true,
      order: 1,
      kind: QuestionKind::Dropdown {
        options: vec!["A & B".to_string()],
      },
    }];
    let mut ctx = survey_context();
    ctx.insert("fields", &field_views(&questions, None));
    let html = pages.render("survey.html", &ctx).expect("render");

    assert!(html.contains("1. &lt;script&gt;alert(1)&lt;&#x2F;script&gt; *"));
    assert!(html.contains("Select an option"));
    assert!(html.contains("A &amp; B"));
    assert!(!html.contains("<script>alert(1)"));
  }

  #[test]
  fn survey_page_empty_state() {
    let pages = Pages::load().expect("templates");
    let mut ctx = survey_context();
    ctx.insert("fields", &Vec::<String>::new());
    let html = pages.render("survey.html", &ctx).expect("render");
    assert!(html.contains("No questions are available yet. Please check back soon."));
  }

  #[test]
  fn dashboard_and_report_pages_render() {
    let pages = Pages::load().expect("templates");
    let state = DashboardState::default();
    let mut ctx = Context::new();
    ctx.insert("view", &state.view(EditorView::blank()));
    ctx.insert("admin_email", "boss@example.com");
    ctx.insert("notice", &None::<String>);
    let html = pages.render("dashboard.html", &ctx).expect("dashboard");
    assert!(html.contains("No charts available yet."));
    assert!(html.contains("No reports yet."));
    assert!(html.contains("No questions yet."));

    let mut ctx = Context::new();
    ctx.insert("draft", &ReportDraft::default());
    ctx.insert(
      "reasons",
      &ReportReason::ALL.iter().map(|r| r.as_str()).collect::<Vec<_>>(),
    );
    ctx.insert("toast", &None::<String>);
    ctx.insert("error", &None::<String>);
    ctx.insert("config_error", &None::<String>);
    let html = pages.render("report.html", &ctx).expect("report");
    assert!(html.contains("Privacy concern"));
  }
}
