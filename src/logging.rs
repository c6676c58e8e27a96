//! Logging configuration using tracing
//!
//! Structured logging to stderr. `RUST_LOG` takes precedence; otherwise the
//! service logs at info (debug with `--verbose`) and dependencies at warn.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directives used when RUST_LOG is unset
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "bookreview=debug,warn"
    } else {
        "bookreview=info,warn"
    }
}

fn build_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directives(verbose)))
}

/// Initialize the tracing subscriber
///
/// Per-request lines come from the server middleware at info; cache hits,
/// misses and refused requests are logged at debug.
///
/// # Example RUST_LOG values
/// - `RUST_LOG=debug` - Everything at debug, dependencies included
/// - `RUST_LOG=bookreview::cache=trace` - Trace the cache-aside path only
///
/// # Errors
/// Returns an error if the subscriber has already been initialized
pub fn init(verbose: bool) -> crate::Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::registry()
        .with(build_filter(rust_log.as_deref(), verbose))
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .compact(),
        )
        .try_init()
        .map_err(|e| {
            crate::BookReviewError::Other(format!("Failed to initialize tracing: {}", e))
        })?;

    Ok(())
}

/// Initialize logging for tests (no-op if already initialized)
pub fn init_test() {
    let _ = init(false);
}
