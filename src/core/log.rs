// Define a new module for logging initialization
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Installs the global subscriber. Our own spans log at `info` by default and
/// at `debug` with `verbose`; browser protocol chatter stays at `warn` unless
/// `RUST_LOG` asks for more.
pub fn init_logging(verbose: bool) {
    let (level_filter, level) = if verbose {
        (LevelFilter::DEBUG, "debug,chromiumoxide=warn")
    } else {
        (LevelFilter::INFO, "info,chromiumoxide=warn")
    };
    let app_filter = Targets::new()
        .with_target("quotetrack", level_filter)
        .with_default(LevelFilter::WARN);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(app_filter)
        .with(env_filter)
        .init();
}
