//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber
///
/// `RUST_LOG` takes precedence; otherwise the library and both binaries log
/// at `info`, or at `debug` when `verbose` is set.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

/// Filter directives covering the library and the `credit-train`/`credit-serve` targets
fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    ["credit_scoring", "credit_train", "credit_serve"]
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}
