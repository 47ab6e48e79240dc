//! Tracing subscriber setup for the CLI.

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "enrollment_core=info,enrollment_runtime=info";

/// Install a fmt subscriber on stderr. `RUST_LOG` overrides the defaults.
/// Calling it twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
