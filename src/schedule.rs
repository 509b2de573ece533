//! Fixed-time job scheduler.
//!
//! Jobs are registered once at startup with a cron-backed trigger and a
//! deferred callback. `run_pending` runs every due job to completion, in
//! registration order, and moves it to its next occurrence. Nothing runs at
//! registration time.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveTime, Weekday};
use cron::Schedule;

/// Poll interval for the scheduler loop.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A fixed-time trigger backed by a cron schedule.
///
/// Accepted forms: `HH:MM` (daily), `<weekday> HH:MM` (weekly, e.g. `mon 10:00`)
/// or a five-field cron expression (`30 9 * * Mon-Fri`).
pub struct Trigger {
  source: String,
  schedule: Schedule,
}

impl Trigger {
  /// First occurrence strictly after `after`; `None` once the schedule is exhausted.
  pub fn next_after(&self, after: DateTime<Local>) -> Option<DateTime<Local>> {
    self.schedule.after(&after).next()
  }
}

impl std::fmt::Debug for Trigger {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("Trigger").field(&self.source).finish()
  }
}

impl std::fmt::Display for Trigger {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.source)
  }
}

/// Parse a five-field cron expression; the seconds field is pinned to 0.
pub fn parse_cron(expr: &str) -> Result<Schedule> {
  format!("0 {}", expr)
    .parse::<Schedule>()
    .with_context(|| format!("invalid cron expression `{}`", expr))
}

impl FromStr for Trigger {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let parse_time =
      |t: &str| NaiveTime::parse_from_str(t, "%H:%M").with_context(|| format!("invalid time `{}`, expected HH:MM", t));

    let expr = match parts.as_slice() {
      [t] => {
        let at = parse_time(t)?;
        at.format("%M %H * * *").to_string()
      }
      [d, t] => {
        let weekday = d
          .parse::<Weekday>()
          .map_err(|_| anyhow::anyhow!("invalid weekday `{}`", d))?;
        let at = parse_time(t)?;
        format!("{} {}", at.format("%M %H * *"), weekday)
      }
      [_, _, _, _, _] => s.trim().to_string(),
      _ => anyhow::bail!(
        "invalid schedule `{}`, expected `HH:MM`, `<weekday> HH:MM` or a cron expression",
        s
      ),
    };

    Ok(Trigger {
      source: s.trim().to_string(),
      schedule: parse_cron(&expr)?,
    })
  }
}

type Task<'a> = Box<dyn FnMut(DateTime<Local>) -> Result<()> + 'a>;

struct Job<'a> {
  name: String,
  trigger: Trigger,
  next_run: Option<DateTime<Local>>,
  task: Task<'a>,
}

#[derive(Default)]
pub struct Scheduler<'a> {
  jobs: Vec<Job<'a>>,
}

impl<'a> Scheduler<'a> {
  pub fn new() -> Self {
    Self { jobs: Vec::new() }
  }

  /// Register `task` under `trigger`; its first run is the next occurrence after `now`.
  pub fn every<F>(&mut self, name: &str, trigger: Trigger, now: DateTime<Local>, task: F)
  where
    F: FnMut(DateTime<Local>) -> Result<()> + 'a,
  {
    let next_run = trigger.next_after(now);
    match next_run {
      Some(at) => tracing::info!(job = name, schedule = %trigger, next_run = %at, "job registered"),
      None => tracing::warn!(job = name, schedule = %trigger, "schedule has no upcoming run"),
    }

    self.jobs.push(Job {
      name: name.to_string(),
      trigger,
      next_run,
      task: Box::new(task),
    });
  }

  /// Next run time per job, in registration order.
  #[cfg(test)]
  pub fn next_runs(&self) -> Vec<(&str, Option<DateTime<Local>>)> {
    self.jobs.iter().map(|j| (j.name.as_str(), j.next_run)).collect()
  }

  /// Run every job due at `now`; returns how many ran. Failures are logged, not propagated.
  pub fn run_pending(&mut self, now: DateTime<Local>) -> usize {
    let mut ran = 0;

    for job in self.jobs.iter_mut().filter(|j| j.next_run.is_some_and(|at| at <= now)) {
      tracing::info!(job = %job.name, "job starting");

      match (job.task)(now) {
        Ok(()) => tracing::info!(job = %job.name, "job finished"),
        Err(e) => tracing::error!(job = %job.name, error = %format!("{:#}", e), "job failed"),
      }

      job.next_run = job.trigger.next_after(now);
      ran += 1;
    }

    ran
  }

  /// Poll forever, once per [`POLL_INTERVAL`].
  pub fn run_forever(&mut self) -> ! {
    loop {
      self.run_pending(Local::now());
      std::thread::sleep(POLL_INTERVAL);
    }
  }
}
