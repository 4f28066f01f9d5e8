//! Tracing initialization
//!
//! Logs go to stderr so stdout stays free for command output (`utils labels`,
//! `utils validate-config`).

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Map a `-v` count to a level directive.
///
/// Returns `None` when no `-v` was given so the caller can fall back to
/// `RUST_LOG` or the configured level.
pub fn level_for_verbosity(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Initialize tracing for ghsum binaries
///
/// Level precedence: `-v` count > `RUST_LOG` > `default_level` (usually the
/// config file's `log_level`). HTTP internals are capped at `warn` unless
/// `RUST_LOG` says otherwise.
///
/// Set `LOG_FORMAT=json` for structured JSON output.
pub fn init_tracing(default_level: &str, verbose: u8) -> anyhow::Result<()> {
    let base = match level_for_verbosity(verbose) {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
    };
    let filter = base
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }

    Ok(())
}
