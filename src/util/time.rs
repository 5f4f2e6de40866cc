use chrono::{DateTime, SecondsFormat, Utc};

/// Fixed-width RFC 3339 so stored timestamps sort lexicographically.
pub fn to_storage(value: &DateTime<Utc>) -> String {
  value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn from_storage(raw: &str) -> Option<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(raw)
    .ok()
    .map(|ts| ts.with_timezone(&Utc))
}

/// "Submitted" cell of the response table and CSV export.
pub fn display(value: &DateTime<Utc>) -> String {
  value.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Sheet rows use the same shape as a browser's `toISOString`.
pub fn iso_millis(value: &DateTime<Utc>) -> String {
  value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn csv_filename(today: &DateTime<Utc>) -> String {
  format!("survey-responses-{}.csv", today.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn formats_match_expected_shapes() {
    let ts = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
    assert_eq!(display(&ts), "2024-03-09 07:05:01");
    assert_eq!(iso_millis(&ts), "2024-03-09T07:05:01.000Z");
    assert_eq!(csv_filename(&ts), "survey-responses-2024-03-09.csv");
    assert_eq!(from_storage(&to_storage(&ts)), Some(ts));
  }
}
