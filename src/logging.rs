use std::sync::Once;

use tracing_subscriber::EnvFilter;

static TRACING_INIT: Once = Once::new();

/// Installs the global subscriber, writing to stderr so JSON on stdout stays clean.
///
/// `RUST_LOG` wins when set; otherwise only warnings from this crate show, or debug
/// output with `verbose`.
pub fn init(verbose: bool) {
    TRACING_INIT.call_once(|| {
        let default = if verbose {
            "finboard=debug"
        } else {
            "finboard=warn"
        };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}
