use std::io;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Helper macro for logging elapsed time at trace level.
///
/// Usage:
/// ```rust,ignore
/// let start = Instant::now();
/// // ... some work ...
/// trace_time!(start, "build_matrix");
/// // Or with additional fields:
/// trace_time!(start, "extract", file_id = file.id());
/// ```
#[macro_export]
macro_rules! trace_time {
    ($start:expr, $name:expr) => {
        tracing::trace!(elapsed = ?$start.elapsed(), $name);
    };
    ($start:expr, $name:expr $(, $field:ident = $value:expr)*) => {
        tracing::trace!(elapsed = ?$start.elapsed(), $($field = $value),*, $name);
    };
}

/// Initialize structured logging based on CLI arguments
///
/// `FILEREC_LOG` (then `RUST_LOG`) overrides the level chosen by the flags.
/// Logs always go to stderr so stdout stays parseable.
pub fn init_tracing(
    verbose: bool,
    log_level: Option<&str>,
    log_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let directive = match log_level {
        Some(level) => directive_for(level),
        None if verbose => directive_for("debug"),
        None => directive_for("warn"),
    };

    let json_layer = log_json.then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(io::stderr)
    });
    let text_layer = (!log_json).then(|| {
        fmt::layer()
            .compact()
            .with_target(false)
            .with_ansi(false)
            .with_writer(io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter(&directive))
        .with(json_layer)
        .with(text_layer)
        .try_init()?;
    Ok(())
}

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_env("FILEREC_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Filter directive for a bare level such as `info`; full directives pass through
fn directive_for(level: &str) -> String {
    if level.contains('=') {
        level.to_string()
    } else {
        format!("filerec={level},filerec_core={level}")
    }
}
