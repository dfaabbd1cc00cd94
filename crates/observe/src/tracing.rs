use {
    crate::Config,
    std::{io::IsTerminal, sync::Once},
    time::macros::format_description,
    tracing::Level,
    tracing_subscriber::{
        EnvFilter,
        Layer,
        Registry,
        fmt::{time::UtcTime, writer::MakeWriterExt as _},
        prelude::*,
        util::SubscriberInitExt,
    },
};

/// Initializes the global tracing subscriber. Panics if one has already been
/// installed.
pub fn initialize(config: &Config) {
    tracing_subscriber::registry()
        .with(fmt_layer(config))
        .init();
}

/// Like [`initialize`], but can be called multiple times in a row. Later calls
/// are ignored.
///
/// Useful for tests.
pub fn initialize_reentrant(env_filter: &str) {
    // The subscriber is a global object so initializing it again in the same
    // process (e.g. from another test thread) would fail.
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        let config = Config::default().with_env_filter(env_filter);
        let _ = tracing_subscriber::registry()
            .with(fmt_layer(&config))
            .try_init();
    });
}

fn fmt_layer(config: &Config) -> Box<dyn Layer<Registry> + Send + Sync> {
    let writer = std::io::stdout
        .with_min_level(config.stderr_threshold.unwrap_or(Level::ERROR))
        .or_else(std::io::stderr);
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_timer(UtcTime::new(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
        )))
        .with_ansi(std::io::stdout().is_terminal());
    let env_filter = EnvFilter::new(&config.env_filter);

    if config.use_json_format {
        layer.json().with_filter(env_filter).boxed()
    } else {
        layer.with_filter(env_filter).boxed()
    }
}
