use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber: stderr, `info` unless `RUST_LOG` says otherwise.
pub fn init(json: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false);

  let installed = if json {
    builder.json().try_init()
  } else {
    builder.try_init()
  };

  // A subscriber may already be installed (tests); keep it.
  if let Err(e) = installed {
    tracing::debug!(error = %e, "keeping the existing tracing subscriber");
  }
}
