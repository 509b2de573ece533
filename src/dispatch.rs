// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Render report entries as WeCom markdown and deliver the message to a chat sink
// role: dispatch/render+publish
// inputs: ReportEntry slices; report date; webhook URL
// outputs: Markdown text; one webhook POST per publish
// side_effects: Network call to the group-robot webhook (WebhookSink) or stdout write (StdoutSink)
// invariants:
// - Entries render in input order, each block ending with the separator rule
// - The blocker note is never rendered
// errors: Transport failures and non-2xx statuses surface to the caller; response bodies are not interpreted
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::Serialize;

use crate::model::ReportEntry;
use crate::util::redact_secrets;

pub const SEPARATOR: &str = "------------------------";

/// Render the chat message for one batch of entries.
pub fn render(entries: &[ReportEntry], today: NaiveDate) -> String {
  let mut lines: Vec<String> = vec![
    format!("**🚨 每周缺陷战报 | {}**\n", today.format("%Y-%m-%d")),
    SEPARATOR.to_string(),
  ];

  for e in entries {
    lines.push(format!(
      "`{}` [{} {}]({})\n▸ {} | @{} | 滞留：{}天\n▸ 最后更新：{}\n{}",
      e.priority_label, e.id, e.title, e.link, e.status, e.assignee_name, e.days_pending, e.last_updated, SEPARATOR
    ));
  }

  lines.join("\n")
}

#[derive(Debug, Serialize)]
struct MarkdownBody<'a> {
  content: &'a str,
}

#[derive(Debug, Serialize)]
struct MarkdownMessage<'a> {
  msgtype: &'static str,
  markdown: MarkdownBody<'a>,
}

/// Where rendered reports go.
pub trait ChatSink {
  fn publish(&self, markdown: &str) -> Result<()>;
}

/// WeCom group-robot webhook.
pub struct WebhookSink {
  agent: ureq::Agent,
  url: String,
}

impl WebhookSink {
  pub fn new(url: &str) -> Self {
    Self {
      agent: ureq::AgentBuilder::new().build(),
      url: url.to_string(),
    }
  }
}

impl ChatSink for WebhookSink {
  fn publish(&self, markdown: &str) -> Result<()> {
    let msg = MarkdownMessage {
      msgtype: "markdown",
      markdown: MarkdownBody { content: markdown },
    };

    let resp = match self.agent.post(&self.url).send_json(&msg) {
      Ok(r) => r,
      Err(ureq::Error::Status(code, _)) => {
        bail!("webhook {} answered HTTP {}", redact_secrets(&self.url), code)
      }
      // ureq's transport errors echo the full URL, key included.
      Err(e) => bail!(
        "posting to webhook {}: {}",
        redact_secrets(&self.url),
        redact_secrets(&e.to_string())
      ),
    };

    // Delivery is fire-and-forget; the robot's errcode is only logged.
    let ack = resp.into_string().unwrap_or_default();
    tracing::debug!(ack = ack.trim(), "webhook acknowledged");

    Ok(())
  }
}

/// Prints messages instead of posting them (`--dry-run`).
pub struct StdoutSink;

impl ChatSink for StdoutSink {
  fn publish(&self, markdown: &str) -> Result<()> {
    println!("{}\n", markdown);
    Ok(())
  }
}
