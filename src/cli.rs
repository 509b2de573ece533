use anyhow::{bail, Context, Result};
use clap::Parser;

use crate::schedule::Trigger;
use crate::tracker::IssueType;
use crate::window::parse_offset_weeks;

#[derive(Parser, Debug)]
#[command(
    name = "coding-defect-report",
    version,
    about = "Post weekly Coding defect digests to a WeCom group webhook",
    long_about = None
)]
pub struct Cli {
  /// Coding Open API endpoint
  #[arg(long, env = "CODING_API_URL", default_value = "https://e.coding.net/open-api/")]
  pub api_url: String,

  /// Coding personal access token (sent as a Bearer credential)
  #[arg(long, env = "CODING_TOKEN", hide_env_values = true)]
  pub token: Option<String>,

  /// Coding project name, e.g. minguangxitong
  #[arg(long, env = "CODING_PROJECT")]
  pub project: Option<String>,

  /// Base URL for issue links, e.g. https://team.coding.net/p/<project>/bug-tracking
  #[arg(long, env = "CODING_ISSUES_URL")]
  pub issues_url: Option<String>,

  /// WeCom group-robot webhook URL (not needed with --dry-run)
  #[arg(long, env = "WECOM_WEBHOOK_URL", hide_env_values = true)]
  pub webhook_url: Option<String>,

  /// Issue type to report on
  #[arg(long, value_enum, default_value_t = IssueType::Defect)]
  pub issue_type: IssueType,

  /// Only report issues assigned to this team member (repeatable; default: whole team)
  #[arg(long = "member")]
  pub members: Vec<String>,

  /// Page size for the team-member lookup
  #[arg(long, default_value_t = 100)]
  pub member_page_size: u32,

  /// Which week to report: 0 = this week, 1 = last week, ...
  #[arg(long, env = "REPORT_WEEKS_AGO", default_value = "1")]
  pub weeks_ago: String,

  /// Daily trigger (HH:MM or a five-field cron expression); reports the current week
  #[arg(long, default_value = "09:30")]
  pub daily_at: String,

  /// Weekly trigger (<weekday> HH:MM or a five-field cron expression); reports the week selected by --weeks-ago
  #[arg(long, default_value = "mon 10:00")]
  pub weekly_at: String,

  /// Run the report once and exit instead of scheduling
  #[arg(long)]
  pub once: bool,

  /// Print messages to stdout instead of posting them
  #[arg(long)]
  pub dry_run: bool,

  /// Emit logs as JSON lines
  #[arg(long)]
  pub log_json: bool,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,

  /// Override the "now" instant (hidden; tests only)
  #[arg(long = "now-override", hide = true)]
  pub now_override: Option<String>,
}

#[derive(Debug)]
pub struct EffectiveConfig {
  pub api_url: String,
  pub token: String,
  pub project: String,
  pub issues_url: String,
  /// `None` only in dry-run mode.
  pub webhook_url: Option<String>,
  pub issue_type: IssueType,
  pub members: Vec<String>,
  pub member_page_size: u32,
  pub weeks_ago: i64,
  pub daily: Trigger,
  pub weekly: Trigger,
  pub once: bool,
  pub dry_run: bool,
  pub now_override: Option<String>,
}

fn required(value: Option<String>, flag: &str, env: &str) -> Result<String> {
  match value.map(|v| v.trim().to_string()) {
    Some(v) if !v.is_empty() => Ok(v),
    _ => bail!("missing {} (or set {})", flag, env),
  }
}

pub fn normalize(cli: Cli) -> Result<EffectiveConfig> {
  let token = required(cli.token, "--token", "CODING_TOKEN")?;
  let project = required(cli.project, "--project", "CODING_PROJECT")?;
  let issues_url = required(cli.issues_url, "--issues-url", "CODING_ISSUES_URL")?;

  let webhook_url = if cli.dry_run {
    None
  } else {
    Some(required(cli.webhook_url, "--webhook-url", "WECOM_WEBHOOK_URL")?)
  };

  if cli.member_page_size == 0 {
    bail!("--member-page-size must be at least 1");
  }

  let daily: Trigger = cli.daily_at.parse().context("parsing --daily-at")?;
  let weekly: Trigger = cli.weekly_at.parse().context("parsing --weekly-at")?;

  Ok(EffectiveConfig {
    api_url: cli.api_url,
    token,
    project,
    issues_url,
    webhook_url,
    issue_type: cli.issue_type,
    members: cli.members,
    member_page_size: cli.member_page_size,
    weeks_ago: parse_offset_weeks(&cli.weeks_ago),
    daily,
    weekly,
    once: cli.once,
    dry_run: cli.dry_run,
    now_override: cli.now_override,
  })
}
