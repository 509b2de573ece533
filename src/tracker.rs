// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Coding Open API access: team-member lookup and paginated issue listing for a date window
// role: tracker/api
// inputs: api url + bearer token; project name; assignee filter string; DateWindow
// outputs: TeamMember lists; lazy batches of RawIssue
// side_effects: One blocking POST per member lookup and per issue page
// invariants:
// - At most MAX_PAGES pages of PAGE_SIZE; iteration ends at the first empty page
// - The ASSIGNEE condition value is the comma-joined id string, passed through untouched
// - After an error the page iterator yields nothing more
// errors: Transport, HTTP status, `Response.Error` envelopes and missing lists are all fatal for the run
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::ext::serde_json::JsonFetch;
use crate::model::{RawIssue, TeamMember};
use crate::window::DateWindow;

pub const PAGE_SIZE: usize = 10;
pub const MAX_PAGES: usize = 5;

pub const ACTION_ISSUE_LIST: &str = "DescribeIssueList";
pub const ACTION_TEAM_MEMBERS: &str = "DescribeTeamMembers";

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
#[value(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
  All,
  Defect,
  Requirement,
  Mission,
  Epic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Condition {
  pub key: String,
  pub value: String,
}

/// Request body of `DescribeIssueList`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IssueQuery {
  pub project_name: String,
  pub issue_type: IssueType,
  pub offset: String,
  pub limit: String,
  pub conditions: Vec<Condition>,
  pub sort_key: String,
  pub sort_value: String,
}

impl IssueQuery {
  /// Query for page `page` (0-based), newest codes first.
  pub fn page(project: &str, issue_type: IssueType, window: &DateWindow, assignee_filter: &str, page: usize) -> Self {
    Self {
      project_name: project.to_string(),
      issue_type,
      offset: (page * PAGE_SIZE).to_string(),
      limit: PAGE_SIZE.to_string(),
      conditions: vec![
        Condition {
          key: "ASSIGNEE".into(),
          value: assignee_filter.to_string(),
        },
        Condition {
          key: "CREATED_AT".into(),
          value: window.created_at_condition(),
        },
      ],
      sort_key: "CODE".into(),
      sort_value: "DESC".into(),
    }
  }
}

// --- Trait seam for the tracker API ---
pub trait TrackerApi {
  fn describe_issue_list(&self, query: &IssueQuery) -> Result<serde_json::Value>;
  fn describe_team_members(&self, page_number: u32, page_size: u32) -> Result<serde_json::Value>;
}

pub struct HttpTrackerApi {
  agent: ureq::Agent,
  api_url: String,
  authorization: String,
}

impl HttpTrackerApi {
  pub fn new(api_url: &str, token: &str) -> Self {
    Self {
      agent: ureq::AgentBuilder::new().build(),
      api_url: api_url.to_string(),
      authorization: bearer(token),
    }
  }

  fn call<B: Serialize>(&self, action: &str, body: &B) -> Result<serde_json::Value> {
    tracing::debug!(action, "calling tracker");

    let resp = match self
      .agent
      .post(&self.api_url)
      .query("action", action)
      .set("Accept", "application/json")
      .set("Authorization", &self.authorization)
      .send_json(body)
    {
      Ok(r) => r,
      Err(ureq::Error::Status(code, r)) => {
        let text = r.into_string().unwrap_or_default();
        bail!("{} failed with HTTP {}: {}", action, code, text.trim())
      }
      Err(e) => return Err(e).with_context(|| format!("calling {}", action)),
    };

    let v: serde_json::Value = resp
      .into_json()
      .with_context(|| format!("decoding {} response", action))?;
    check_envelope(action, &v)?;

    Ok(v)
  }
}

impl TrackerApi for HttpTrackerApi {
  fn describe_issue_list(&self, query: &IssueQuery) -> Result<serde_json::Value> {
    self.call(ACTION_ISSUE_LIST, query)
  }

  fn describe_team_members(&self, page_number: u32, page_size: u32) -> Result<serde_json::Value> {
    let body = serde_json::json!({
      "PageNumber": page_number,
      "PageSize": page_size,
    });
    self.call(ACTION_TEAM_MEMBERS, &body)
  }
}

/// The Open API answers 200 with `Response.Error` on bad tokens, unknown projects and the like.
fn check_envelope(action: &str, v: &serde_json::Value) -> Result<()> {
  if let Some(err) = v
    .fetch("Response.Error")
    .to::<serde_json::Value>()
    .filter(|e| !e.is_null())
  {
    let code = err.fetch("Code").to_or_default::<String>();
    let message = err.fetch("Message").to_or_default::<String>();
    bail!("{} rejected: {} {}", action, code, message);
  }

  Ok(())
}

/// Build the Authorization header value, tolerating tokens that already carry the scheme.
pub fn bearer(token: &str) -> String {
  let t = token.trim();

  if t.starts_with("Bearer ") {
    t.to_string()
  } else {
    format!("Bearer {}", t)
  }
}

/// Look up the team roster (first page only).
pub fn list_team_members(api: &dyn TrackerApi, page_size: u32) -> Result<Vec<TeamMember>> {
  let v = api.describe_team_members(1, page_size)?;
  let members: Vec<TeamMember> = v.fetch("Response.Data.TeamMembers").require()?;
  tracing::debug!(count = members.len(), "team members loaded");

  if let Some(total) = v.fetch("Response.Data.TotalCount").to::<usize>() {
    if total > members.len() {
      tracing::warn!(
        total,
        loaded = members.len(),
        page_size,
        "team has more members than one page holds; raise --member-page-size"
      );
    }
  }

  Ok(members)
}

/// Comma-joined ids of `members`, restricted to the names in `only` when it is non-empty.
pub fn assignee_filter(members: &[TeamMember], only: &[String]) -> String {
  members
    .iter()
    .filter(|m| only.is_empty() || only.iter().any(|n| n == &m.name))
    .map(|m| m.id.to_string())
    .collect::<Vec<_>>()
    .join(",")
}

/// Lazy page-by-page issue listing; see [`fetch_pages`].
pub struct IssuePages<'a> {
  api: &'a dyn TrackerApi,
  project: &'a str,
  issue_type: IssueType,
  window: DateWindow,
  assignee_filter: &'a str,
  page: usize,
  done: bool,
}

impl Iterator for IssuePages<'_> {
  type Item = Result<Vec<RawIssue>>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.done || self.page >= MAX_PAGES {
      return None;
    }

    let query = IssueQuery::page(
      self.project,
      self.issue_type,
      &self.window,
      self.assignee_filter,
      self.page,
    );
    let page = self.page;
    self.page += 1;

    let batch = self
      .api
      .describe_issue_list(&query)
      .and_then(|v| v.fetch("Response.IssueList").require::<Vec<RawIssue>>())
      .with_context(|| format!("fetching issue page {}", page));

    match batch {
      Ok(issues) if issues.is_empty() => {
        tracing::debug!(page, "empty page, stopping");
        self.done = true;
        None
      }
      Ok(issues) => {
        tracing::debug!(page, count = issues.len(), "issue page fetched");
        Some(Ok(issues))
      }
      Err(e) => {
        self.done = true;
        Some(Err(e))
      }
    }
  }
}

/// Page through issues created inside `window` and assigned to anyone in `assignee_filter`.
pub fn fetch_pages<'a>(
  api: &'a dyn TrackerApi,
  project: &'a str,
  window: DateWindow,
  assignee_filter: &'a str,
  issue_type: IssueType,
) -> IssuePages<'a> {
  IssuePages {
    api,
    project,
    issue_type,
    window,
    assignee_filter,
    page: 0,
    done: false,
  }
}
