//! Logging setup.
//!
//! Configures the global [`tracing`] subscriber from [`Settings`]: pretty,
//! human-readable output in debug mode (or when `log_format = "console"`),
//! structured JSON in production. Scoped logging uses `tracing` targets and
//! spans rather than logger instances.

use tracing::Span;

use crate::settings::Settings;

/// Installs the global tracing subscriber based on the given settings.
///
/// Idempotent: a second call (for example from a test harness) is a no-op.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug || settings.log_format == "console" {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates the span that wraps one request's processing.
///
/// # Examples
///
/// ```
/// use gantry_rs_core::logging::request_span;
///
/// let span = request_span("GET", "/users/42");
/// let _guard = span.enter();
/// tracing::debug!("handling request");
/// ```
pub fn request_span(method: &str, path: &str) -> Span {
    tracing::info_span!("request", %method, %path)
}
