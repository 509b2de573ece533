use anyhow::Result;
use clap::Parser;

mod cli;
mod dispatch;
mod ext;
mod logging;
mod model;
mod params;
mod pipeline;
mod schedule;
mod tracker;
mod transform;
mod util;
mod window;

use crate::cli::{normalize, Cli, EffectiveConfig};
use crate::dispatch::{ChatSink, StdoutSink, WebhookSink};
use crate::pipeline::ReportPipeline;
use crate::schedule::Scheduler;
use crate::tracker::HttpTrackerApi;

fn build_pipeline(cfg: &EffectiveConfig) -> ReportPipeline {
  let tracker = Box::new(HttpTrackerApi::new(&cfg.api_url, &cfg.token));

  let sink: Box<dyn ChatSink> = match &cfg.webhook_url {
    Some(url) if !cfg.dry_run => {
      tracing::info!(webhook = %util::redact_secrets(url), "posting to webhook");
      Box::new(WebhookSink::new(url))
    }
    _ => Box::new(StdoutSink),
  };

  ReportPipeline::new(params::build_report_params(cfg), tracker, sink)
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  logging::init(cli.log_json);

  // Phase 1: normalize CLI + env
  let cfg = normalize(cli)?;
  let now_opt = crate::window::parse_now_override(cfg.now_override.as_deref());
  let pipeline = build_pipeline(&cfg);

  // Phase 2: one-shot run
  if cfg.once {
    pipeline.run(cfg.weeks_ago, util::effective_now(now_opt))?;
    return Ok(());
  }

  // Phase 3: fixed-time schedule; callbacks are deferred until their trigger fires
  let weeks_ago = cfg.weeks_ago;
  let mut scheduler = Scheduler::new();
  let now = util::effective_now(now_opt);

  scheduler.every("daily", cfg.daily, now, |at| pipeline.run(0, at).map(|_| ()));
  scheduler.every("weekly", cfg.weekly, now, |at| pipeline.run(weeks_ago, at).map(|_| ()));

  scheduler.run_forever()
}
