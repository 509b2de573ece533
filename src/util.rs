// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Utilities for secret redaction, the effective clock, and man page rendering
// role: utilities/helpers
// inputs: Log-bound strings; optional now override; clap CommandFactory
// outputs: Redacted text, the run's "now", man page text
// invariants:
// - redact_secrets never leaves a bearer token or a webhook `key=` value in its output
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::{DateTime, Local};
use clap::CommandFactory;
use once_cell::sync::Lazy;

static RE_BEARER: Lazy<regex::Regex> = Lazy::new(|| regex::Regex::new(r"Bearer\s+[A-Za-z0-9._~+/=-]+").unwrap());
static RE_KEY_PARAM: Lazy<regex::Regex> =
  Lazy::new(|| regex::Regex::new(r"(?i)([?&](?:key|token|access_token)=)[^&\s]+").unwrap());

/// Mask bearer tokens and credential query parameters before text reaches the logs.
pub fn redact_secrets(text: &str) -> String {
  let out = RE_BEARER.replace_all(text, "Bearer [REDACTED]");
  RE_KEY_PARAM.replace_all(&out, "${1}[REDACTED]").to_string()
}

/// Returns the effective "now" given an optional override.
///
/// When `override_now` is `Some`, that instant is returned; otherwise
/// the current local time is used.
pub fn effective_now(override_now: Option<DateTime<Local>>) -> DateTime<Local> {
  override_now.unwrap_or_else(Local::now)
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
/// Returns the troff content as a UTF-8 string.
pub fn render_man_page<T: CommandFactory>() -> anyhow::Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
