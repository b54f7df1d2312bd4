//! Tracing subscriber bootstrap shared by the server binary and the CLI.

use anyhow::anyhow;
use bookshelf_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter directive used when `RUST_LOG` is not set.
///
/// The configured level applies to the workspace crates and `tower_http`;
/// everything else logs at `warn`.
pub fn default_directives(level: &str) -> String {
    format!(
        "warn,bookshelf_app={level},bookshelf_http={level},bookshelf_kernel={level},bookshelf_cli={level},tower_http={level}"
    )
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `settings.log_level`.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(&settings.log_level)))
        .map_err(|e| anyhow!("invalid log filter '{}': {}", settings.log_level, e))?;

    let registry = tracing_subscriber::registry().with(filter);

    let result = match settings.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .try_init(),
    };
    result.map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))?;

    tracing::debug!(
        target: "bookshelf-telemetry",
        format = ?settings.log_format,
        level = %settings.log_level,
        "telemetry initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_parse() {
        let directives = default_directives("debug");
        assert!(directives.contains("bookshelf_app=debug"));
        assert!(EnvFilter::try_new(directives).is_ok());
    }

    #[test]
    fn second_init_reports_error() {
        let settings = TelemetrySettings::default();
        let _ = init(&settings);
        assert!(init(&settings).is_err());
    }
}
