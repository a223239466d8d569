//! Process startup helpers shared by the server binary and the CLI.

use geotech_config::AppConfig;
use geotech_telemetry::{LoggingConfig, TracingConfig};

/// Logging and tracing settings for a server process.
pub fn tracing_config(config: &AppConfig) -> TracingConfig {
    let telemetry = &config.telemetry;
    TracingConfig::new(telemetry.service_name.clone())
        .with_enabled(telemetry.tracing_enabled)
        .with_sampling_rate(telemetry.sampling_ratio)
        .with_attribute("llm.model", config.llm.model.clone())
        .with_logging(
            LoggingConfig::new()
                .with_level(telemetry.log_level.clone())
                .with_json(telemetry.json_logs),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_config_follows_settings() {
        let mut config = AppConfig::default();
        config.telemetry.tracing_enabled = true;
        config.telemetry.json_logs = true;
        config.telemetry.log_level = "debug".to_string();

        let tracing = tracing_config(&config);
        assert!(tracing.enabled);
        assert_eq!(tracing.service_name, "geotech-assistant");
        assert!(tracing.logging.json);
        assert_eq!(tracing.logging.level, "debug");
    }
}
