use chrono::{DateTime, Local, TimeZone};

use crate::model::{Assignee, RawIssue, ReportEntry};

pub const DEFAULT_PRIORITY: &str = "2";
pub const UNASSIGNED: &str = "未分配";
pub const UNTITLED: &str = "无标题缺陷";
pub const UNKNOWN_STATUS: &str = "未知状态";
pub const BLOCKER_PENDING: &str = "待补充";

const MS_PER_DAY: i64 = 86_400_000;

/// Display label for a tracker priority code. Unknown codes read as high.
pub fn priority_label(code: Option<&str>) -> &'static str {
  match code.unwrap_or(DEFAULT_PRIORITY).trim() {
    "3" => "🔥紧急",
    "1" => "⚡中",
    "0" => "🌿低",
    _ => "⚠️高",
  }
}

fn assignee_name(assignee_id: Option<i64>, assignees: &[Assignee]) -> String {
  assignee_id
    .and_then(|id| assignees.iter().find(|a| a.id == id))
    .map(|a| a.name.clone())
    .unwrap_or_else(|| UNASSIGNED.to_string())
}

/// Whole days between `created_at_ms` and `now`; never negative.
pub fn days_pending(created_at_ms: i64, now: DateTime<Local>) -> i64 {
  (now.timestamp_millis() - created_at_ms).div_euclid(MS_PER_DAY).max(0)
}

/// Epoch milliseconds as local `YYYY-MM-DD HH:MM`.
pub fn format_local_ms(ms: i64) -> String {
  match Local.timestamp_millis_opt(ms).single() {
    Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
    None => String::new(),
  }
}

/// Description when it has any content, otherwise the pending placeholder.
pub fn blocker_note(description: Option<&str>) -> String {
  match description {
    Some(d) if !d.trim().is_empty() => d.to_string(),
    _ => BLOCKER_PENDING.to_string(),
  }
}

/// Map one page of raw issues to report entries, preserving order.
pub fn normalize(batch: &[RawIssue], now: DateTime<Local>, issues_url: &str) -> Vec<ReportEntry> {
  let base = issues_url.trim_end_matches('/');

  batch
    .iter()
    .map(|issue| {
      let id = issue.code.clone().unwrap_or_default();

      ReportEntry {
        link: format!("{}/issues/{}", base, id),
        title: issue.name.clone().unwrap_or_else(|| UNTITLED.to_string()),
        priority_label: priority_label(issue.priority.as_deref()).to_string(),
        assignee_name: assignee_name(issue.assignee_id, &issue.assignees),
        status: issue
          .issue_status_name
          .clone()
          .unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
        days_pending: days_pending(issue.created_at.unwrap_or(0), now),
        last_updated: format_local_ms(issue.updated_at.unwrap_or(0)),
        blocker_note: blocker_note(issue.description.as_deref()),
        id,
      }
    })
    .collect()
}
