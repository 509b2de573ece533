use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use crate::dispatch::{render, ChatSink};
use crate::tracker::{assignee_filter, fetch_pages, list_team_members, IssueType, TrackerApi};
use crate::transform::normalize;
use crate::window::{compute_week, DateWindow};

/// Per-run inputs that do not change between scheduled runs.
#[derive(Debug, Clone)]
pub struct ReportParams {
  pub project: String,
  pub issue_type: IssueType,
  pub issues_url: String,
  /// Member names to report on; empty means the whole team.
  pub members: Vec<String>,
  pub member_page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
  pub window: DateWindow,
  pub pages: usize,
  pub issues: usize,
}

/// Window → members → pages → (normalize → render → publish) per page.
pub struct ReportPipeline {
  params: ReportParams,
  tracker: Box<dyn TrackerApi>,
  sink: Box<dyn ChatSink>,
}

impl ReportPipeline {
  pub fn new(params: ReportParams, tracker: Box<dyn TrackerApi>, sink: Box<dyn ChatSink>) -> Self {
    Self { params, tracker, sink }
  }

  pub fn run(&self, offset_weeks: i64, now: DateTime<Local>) -> Result<RunSummary> {
    let today = now.date_naive();
    let window = compute_week(offset_weeks, today)?;
    let _span = tracing::info_span!("report", window = %window).entered();

    let mut summary = RunSummary {
      window,
      pages: 0,
      issues: 0,
    };

    let members = list_team_members(self.tracker.as_ref(), self.params.member_page_size)
      .context("looking up team members")?;
    let filter = assignee_filter(&members, &self.params.members);

    if filter.is_empty() {
      tracing::warn!(
        team_size = members.len(),
        requested = ?self.params.members,
        "no matching team members, nothing to report"
      );
      return Ok(summary);
    }

    let pages = fetch_pages(
      self.tracker.as_ref(),
      &self.params.project,
      window,
      &filter,
      self.params.issue_type,
    );

    for batch in pages {
      let batch = batch?;
      let entries = normalize(&batch, now, &self.params.issues_url);
      let markdown = render(&entries, today);

      self
        .sink
        .publish(&markdown)
        .with_context(|| format!("publishing page {}", summary.pages))?;

      summary.pages += 1;
      summary.issues += entries.len();
      tracing::info!(page = summary.pages, issues = entries.len(), "report page published");
    }

    tracing::info!(window = %summary.window, pages = summary.pages, issues = summary.issues, "report finished");

    Ok(summary)
  }
}
