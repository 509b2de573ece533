// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Define the tracker wire records (issues, members) and the normalized report entry
// role: model/types
// outputs: Deserializable Coding records with lenient optional fields; ReportEntry for rendering
// invariants: Wire field names are PascalCase as the Coding Open API sends them; missing fields never fail parsing
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Assignee {
  #[serde(default)]
  pub id: i64,
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "PascalCase")]
pub struct RawIssue {
  #[serde(default, deserialize_with = "string_or_number")]
  pub code: Option<String>,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default, deserialize_with = "string_or_number")]
  pub priority: Option<String>,
  #[serde(default)]
  pub assignee_id: Option<i64>,
  #[serde(default)]
  pub assignees: Vec<Assignee>,
  #[serde(default)]
  pub created_at: Option<i64>,
  #[serde(default)]
  pub updated_at: Option<i64>,
  #[serde(default)]
  pub issue_status_name: Option<String>,
  #[serde(default)]
  pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct TeamMember {
  pub id: i64,
  pub name: String,
}

/// One rendered line item, derived from a [`RawIssue`].
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ReportEntry {
  pub id: String,
  pub link: String,
  pub title: String,
  pub priority_label: String,
  pub assignee_name: String,
  pub status: String,
  pub days_pending: i64,
  pub last_updated: String,
  /// Not part of the chat message.
  pub blocker_note: String,
}

/// Accept `"12"`, `12` or `null` and keep the textual form.
fn string_or_number<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let v = Option::<serde_json::Value>::deserialize(de)?;

  Ok(match v {
    Some(serde_json::Value::String(s)) => Some(s),
    Some(serde_json::Value::Number(n)) => Some(n.to_string()),
    _ => None,
  })
}
