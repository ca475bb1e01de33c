use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber. `STREAKLINE_LOG` wins over the config level.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_env("STREAKLINE_LOG")
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
