//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding an `EnvFilter` directive,
/// e.g. `REVIEW_STATS_LOG=review_stats::label=debug`.
pub const LOG_ENV: &str = "REVIEW_STATS_LOG";

static INIT: Once = Once::new();

/// Installs the stderr subscriber.
///
/// `--verbose` forces `review_stats=debug`. Otherwise `REVIEW_STATS_LOG` is
/// used when set and valid, falling back to `review_stats=info`. Calling this
/// more than once is a no-op.
pub fn init(verbose: bool) {
    INIT.call_once(|| {
        let filter = if verbose {
            EnvFilter::new("review_stats=debug")
        } else {
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("review_stats=info"))
        };

        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .with(filter)
            .try_init();
    });
}
