use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use super::{parse_timestamp, Store};
use crate::error::StoreError;
use crate::model::{Report, ReportFields, ReportReason};
use crate::util::time;

impl Store {
  pub fn create_report(&mut self, fields: &ReportFields) -> Result<Report, StoreError> {
    let report = Report {
      id: Uuid::new_v4().to_string(),
      created_at: Utc::now(),
      name: fields.name.clone(),
      email: fields.email.clone(),
      reason: fields.reason,
      description: fields.description.clone(),
      other_reason: fields.other_reason.clone(),
    };
    self.conn.execute(
      "INSERT INTO reports (id, created_at, name, email, reason, description, other_reason) \
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
      params![
        report.id,
        time::to_storage(&report.created_at),
        report.name,
        report.email,
        report.reason.as_str(),
        report.description,
        report.other_reason
      ],
    )?;
    tracing::info!(id = %report.id, reason = report.reason.as_str(), "report stored");
    self.refresh_reports();
    Ok(report)
  }

  /// Newest first.
  pub fn list_reports(&self) -> Result<Vec<Report>, StoreError> {
    let mut stmt = self.conn.prepare(
      "SELECT id, created_at, name, email, reason, description, other_reason \
       FROM reports ORDER BY created_at DESC, rowid DESC",
    )?;
    let rows = stmt.query_map([], |row| {
      Ok((
        row.get::<_, String>(0)?,
        row.get::<_, String>(1)?,
        row.get::<_, String>(2)?,
        row.get::<_, String>(3)?,
        row.get::<_, String>(4)?,
        row.get::<_, String>(5)?,
        row.get::<_, String>(6)?,
      ))
    })?;

    let mut reports = Vec::new();
    for row in rows {
      let (id, created_at, name, email, reason, description, other_reason) = row?;
      let reason = ReportReason::parse(&reason)
        .ok_or_else(|| StoreError::InvalidState(format!("report {id}: reason '{reason}'")))?;
      reports.push(Report {
        created_at: parse_timestamp(&created_at)?,
        id,
        name,
        email,
        reason,
        description,
        other_reason,
      });
    }
    Ok(reports)
  }
}
