use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

/// Installs the global subscriber; `RUST_LOG` takes precedence over `verbose`.
pub fn init_logging(verbose: bool) {
    let env_directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(log_filter(verbose, env_directives.as_deref()))
        .init();
}

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "fundsim=debug,warn"
    } else {
        "fundsim=info,warn"
    }
}

fn log_filter(verbose: bool, env_directives: Option<&str>) -> EnvFilter {
    env_directives
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directives(verbose)))
}
