use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Structured logging via `tracing` + `tracing-subscriber`, the way the
/// rest of this codebase's binaries initialize it: an `EnvFilter` seeded
/// from `RUST_LOG` (falling back to `debug`/`info` depending on
/// `--debug`). `--debug-rpc` additionally switches the formatter to JSON,
/// matching the split between human-facing and machine-facing output.
pub fn init(config: &Config) {
    let default_level = if config.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if config.debug_rpc {
        builder.json().init();
    } else {
        builder.init();
    }
}
