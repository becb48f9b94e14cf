//! Tracing setup for the host binary.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs a `fmt` subscriber filtered by `RUST_LOG`.
///
/// Without `RUST_LOG`, the queue crates log at `info`, or at `debug` when
/// `verbose` is set.
pub fn init_tracing(verbose: bool) {
    let default = if verbose {
        "msgq_core=debug,msgq_host=debug"
    } else {
        "msgq_core=info,msgq_host=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_names(true)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
