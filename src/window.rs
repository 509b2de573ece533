use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate};

// Reporting windows are whole Monday..Sunday calendar weeks.

/// Offset used when the configured value is not a usable integer.
pub const DEFAULT_WEEKS_AGO: i64 = 1;

/// Largest accepted offset (roughly two centuries back).
pub const MAX_WEEKS_AGO: i64 = 10_000;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct DateWindow {
  pub start: NaiveDate,
  pub end: NaiveDate,
}

impl DateWindow {
  /// Value of the tracker's `CREATED_AT` condition: `<start>_<end>`.
  pub fn created_at_condition(&self) -> String {
    format!("{}_{}", self.start.format("%Y-%m-%d"), self.end.format("%Y-%m-%d"))
  }
}

impl std::fmt::Display for DateWindow {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}..{}", self.start, self.end)
  }
}

/// Compute the Monday..Sunday week `offset_weeks` weeks before the week containing `today`.
///
/// `0` is the current week, `1` the previous calendar week, and so on.
///
/// Offsets that would leave chrono's date range are an error.
pub fn compute_week(offset_weeks: i64, today: NaiveDate) -> Result<DateWindow> {
  let weekday = today.weekday().num_days_from_monday() as i64;

  let start = offset_weeks
    .checked_mul(7)
    .and_then(|d| d.checked_add(weekday))
    .and_then(Duration::try_days)
    .and_then(|back| today.checked_sub_signed(back))
    .with_context(|| format!("week offset {} is out of range", offset_weeks))?;
  let end = start
    .checked_add_signed(Duration::days(6))
    .with_context(|| format!("week offset {} is out of range", offset_weeks))?;

  Ok(DateWindow { start, end })
}

/// Parse the weeks-ago setting; anything that is not an integer in
/// `0..=MAX_WEEKS_AGO` falls back to [`DEFAULT_WEEKS_AGO`] with a warning.
pub fn parse_offset_weeks(raw: &str) -> i64 {
  match raw.trim().parse::<i64>() {
    Ok(n) if (0..=MAX_WEEKS_AGO).contains(&n) => n,
    Ok(n) => {
      tracing::warn!(value = n, max = MAX_WEEKS_AGO, "weeks-ago is out of range, using last week instead");
      DEFAULT_WEEKS_AGO
    }
    Err(_) => {
      tracing::warn!(value = raw, "weeks-ago is not an integer, using last week instead");
      DEFAULT_WEEKS_AGO
    }
  }
}

/// Parse a `--now-override` string into a local DateTime.
/// Accepts RFC3339 (e.g. 2025-08-15T12:00:00Z) or a naive local timestamp
/// formatted as `%Y-%m-%dT%H:%M:%S`.
pub fn parse_now_override(s: Option<&str>) -> Option<DateTime<Local>> {
  s.and_then(|raw| {
    chrono::DateTime::parse_from_rfc3339(raw)
      .ok()
      .map(|dt| dt.with_timezone(&Local))
      .or_else(|| {
        chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
          .ok()
          .and_then(|ndt| ndt.and_local_timezone(Local).single())
      })
  })
}
