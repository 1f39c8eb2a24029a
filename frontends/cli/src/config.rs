use anyhow::Result;
use archivist_core::scan::{DetectionWindow, ScanConfig};
use archivist_core::DEFAULT_PAGE_SIZE;
use archivist_remote::RemoteConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings read from `archivist.yaml`. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_url: String,
    pub timeout_secs: u64,
    pub page_size: usize,
    /// Where downloaded receipts and QR images are written
    pub receipt_dir: PathBuf,
    pub scan: ScanSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub fps: u32,
    pub window_width: u32,
    pub window_height: u32,
    pub max_invalid_reads: Option<u32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let remote = RemoteConfig::default();
        Self {
            api_url: remote.base_url,
            timeout_secs: remote.timeout.as_secs(),
            page_size: DEFAULT_PAGE_SIZE,
            receipt_dir: PathBuf::from("."),
            scan: ScanSettings::default(),
        }
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        let defaults = ScanConfig::default();
        Self {
            fps: defaults.fps,
            window_width: defaults.window.width,
            window_height: defaults.window.height,
            max_invalid_reads: defaults.max_invalid_reads,
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e)
        })?;
        Self::from_yaml(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config YAML {}: {}", path.display(), e))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file is a valid, all-default config
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load `path` if given, otherwise `./archivist.yaml` when it exists,
    /// otherwise defaults
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => {
                let local = Path::new("archivist.yaml");
                if local.exists() {
                    Self::load_from_file(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply the API URL override from the command line or environment
    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        if let Some(api_url) = api_url.filter(|url| !url.trim().is_empty()) {
            self.api_url = api_url;
        }
        self
    }

    pub fn remote(&self) -> RemoteConfig {
        RemoteConfig::new(self.api_url.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs.max(1)))
    }

    pub fn scan(&self) -> ScanConfig {
        ScanConfig {
            fps: self.scan.fps.max(1),
            window: DetectionWindow {
                width: self.scan.window_width,
                height: self.scan.window_height,
            },
            max_invalid_reads: self.scan.max_invalid_reads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_yaml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.page_size, 15);
        assert_eq!(config.scan().fps, 10);
        assert_eq!(config.scan().window, DetectionWindow::default());
        assert_eq!(config.scan().max_invalid_reads, None);
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let config = AppConfig::from_yaml(
            "api_url: http://archive.internal:9000\nscan:\n  max_invalid_reads: 5\n",
        )
        .unwrap();

        assert_eq!(config.api_url, "http://archive.internal:9000");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.scan.fps, 10);
        assert_eq!(config.scan().max_invalid_reads, Some(5));
    }

    #[test]
    fn test_override_wins_unless_blank() {
        let config = AppConfig::default().with_api_url(Some("http://10.0.0.2:8000".into()));
        assert_eq!(config.remote().base_url, "http://10.0.0.2:8000");

        let config = config.with_api_url(Some("  ".into()));
        assert_eq!(config.api_url, "http://10.0.0.2:8000");
    }

    #[test]
    fn test_unknown_yaml_shape_is_an_error() {
        assert!(AppConfig::from_yaml("page_size: many").is_err());
    }
}
