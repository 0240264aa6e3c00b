//! Console logging for the pipeline.
//!
//! Loaders log at `info`, per-step details at `debug`, skipped input at
//! `warn`. The `RUST_LOG` environment variable overrides the default filter.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install a stderr fmt subscriber.
///
/// `default_directive` (e.g. `"info"` or `"aquaspatial=debug"`) applies when
/// `RUST_LOG` is unset or invalid. Returns `false` if a global subscriber was
/// already installed, in which case nothing changes.
pub fn init_logging(default_directive: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        init_logging("debug");
        assert!(!init_logging("info"));
        tracing::info!("still logging");
    }
}
