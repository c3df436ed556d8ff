use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::{OotelError, Result};

/// Read, parse and validate a TOML config file
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| OotelError::Config(format!("cannot read {}: {e}", path.display())))?;
    parse_config(&text)
}

/// Parse and validate config text; missing sections stay disabled
pub fn parse_config(text: &str) -> Result<Config> {
    let config = toml::from_str::<Config>(text)
        .map_err(|e| OotelError::Config(format!("invalid config: {e}")))?;
    validate_config(&config).map(|()| config)
}

fn validate_config(cfg: &Config) -> Result<()> {
    if let Some(trace) = &cfg.trace {
        if !(0.0..=1.0).contains(&trace.sample_rate) {
            return Err(OotelError::Config(format!(
                "trace.sample_rate must be within [0.0, 1.0], got {}",
                trace.sample_rate
            )));
        }
        if trace.enabled && trace.service_name.is_empty() {
            return Err(OotelError::Config("trace.service_name must not be empty".to_string()));
        }
    }

    if let Some(metric) = &cfg.metric {
        if metric.server_port == 0 {
            return Err(OotelError::Config("metric.server_port must be within 1-65535".to_string()));
        }
        metric
            .exporter_kind()
            .map_err(|e| OotelError::Config(format!("metric.exporter_type: {e}")))?;
    }

    Ok(())
}
