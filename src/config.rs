use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::{DashConfig, OutputFormat};

pub fn load_config(path: &Path) -> Result<DashConfig> {
    let contents = fs::read_to_string(path).map_err(|err| {
        Error::ConfigIo(format!(
            "failed to read config '{}': {}",
            path.display(),
            err
        ))
    })?;
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .unwrap_or("");

    match ext {
        "toml" => toml::from_str(&contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse TOML: {}", err))),
        "json" => serde_json::from_str(&contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse JSON: {}", err))),
        "" => Err(Error::UnsupportedConfigFormat("unknown".to_string())),
        _ => Err(Error::UnsupportedConfigFormat(ext.to_string())),
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub format: Option<OutputFormat>,
    pub assume_yes: bool,
}

pub fn build_config(path: Option<&Path>, overrides: Overrides) -> Result<DashConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => DashConfig::default(),
    };
    if let Some(endpoint) = overrides.endpoint {
        config.endpoint = Some(endpoint);
    }
    if let Some(interval) = overrides.poll_interval_ms {
        config.poll_interval_ms = interval;
    }
    if let Some(format) = overrides.format {
        config.format = format;
    }
    config.assume_yes |= overrides.assume_yes;
    if config.poll_interval_ms == 0 {
        return Err(Error::NonPositiveResource {
            field: "poll_interval_ms",
            value: 0.0,
        });
    }
    Ok(config)
}

impl DashConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn describe(&self) -> String {
        format!(
            concat!(
                "Endpoint: {}\n",
                "Poll interval: {}ms\n",
                "Request timeout: {}ms\n",
                "Format: {}\n",
                "Assume yes: {}\n",
                "Log filter: {}\n",
            ),
            self.endpoint.as_deref().unwrap_or("(none)"),
            self.poll_interval_ms,
            self.request_timeout_ms,
            self.format,
            self.assume_yes,
            self.log_filter.as_deref().unwrap_or("(default)"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("cluster-dash-{}-{}", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn flags_override_file_values() {
        let path = temp_file(
            "override.toml",
            "endpoint = \"http://a:5000\"\npoll_interval_ms = 500\nformat = \"json\"\n",
        );
        let config = build_config(
            Some(&path),
            Overrides {
                endpoint: Some("http://b:5000".to_string()),
                ..Overrides::default()
            },
        )
        .unwrap();
        assert_eq!(config.endpoint.as_deref(), Some("http://b:5000"));
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.format, OutputFormat::Json);
    }

    #[test]
    fn json_config_is_accepted() {
        let path = temp_file("plain.json", "{\"assume_yes\": true}");
        let config = load_config(&path).unwrap();
        assert!(config.assume_yes);
        assert_eq!(config.request_timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let path = temp_file("config.yaml", "endpoint: x");
        let err = load_config(&path).unwrap_err();
        assert_eq!(err.to_string(), "unsupported config format 'yaml'");
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let overrides = Overrides {
            poll_interval_ms: Some(0),
            ..Overrides::default()
        };
        assert!(build_config(None, overrides).is_err());
    }
}
