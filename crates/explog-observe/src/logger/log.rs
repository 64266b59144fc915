use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::{fmt, fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt};

use crate::logger::{config::LoggerConfig, error::LoggerError, format::LoggerFormat};

/// Install one registry with the filter and the single output layer `cfg.format` selects.
///
/// Unselected outputs are `None` layers, so every format shares the same subscriber type.
pub(crate) fn install(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    if !cfg.format.is_supported() {
        return Err(LoggerError::Unsupported(cfg.format));
    }
    let filter = cfg.level.filter()?;

    let text = (cfg.format == LoggerFormat::Text).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(cfg.use_color)
            .with_target(cfg.with_targets)
            .with_timer(local_timer())
    });
    let json = (cfg.format == LoggerFormat::Json).then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(cfg.with_targets)
            .with_timer(local_timer())
    });
    let journald = match cfg.format {
        LoggerFormat::Journald => Some(journald::layer()?),
        _ => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .with(journald)
        .try_init()
        .map_err(|e| {
            let msg = e.to_string();
            // `TryInitError` only exposes its cause through the message.
            if msg.contains("global default") {
                LoggerError::AlreadyInitialized
            } else {
                LoggerError::InitializationFailed(msg)
            }
        })
}

/// RFC 3339 stamps in the local offset; resolved at install time, before any runtime threads exist.
fn local_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

#[cfg(all(target_os = "linux", feature = "journald"))]
mod journald {
    use crate::logger::error::LoggerError;

    pub(super) fn layer() -> Result<tracing_journald::Layer, LoggerError> {
        tracing_journald::layer()
            .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))
    }
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
mod journald {
    use tracing_subscriber::layer::Identity;

    use crate::logger::{error::LoggerError, format::LoggerFormat};

    pub(super) fn layer() -> Result<Identity, LoggerError> {
        Err(LoggerError::Unsupported(LoggerFormat::Journald))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::LoggerLevel;

    #[test]
    fn second_install_is_rejected() {
        let cfg = LoggerConfig {
            level: LoggerLevel::new("debug").unwrap(),
            use_color: false,
            ..Default::default()
        };
        let _ = install(&cfg);
        let again = LoggerConfig {
            format: LoggerFormat::Json,
            ..cfg
        };
        assert!(install(&again).is_err());
    }

    #[cfg(not(all(target_os = "linux", feature = "journald")))]
    #[test]
    fn journald_without_feature_is_unsupported() {
        let cfg = LoggerConfig {
            format: LoggerFormat::Journald,
            ..Default::default()
        };
        assert!(matches!(
            install(&cfg),
            Err(LoggerError::Unsupported(LoggerFormat::Journald))
        ));
    }
}
