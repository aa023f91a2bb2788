//! Application configuration management

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use eframe::egui;
use serde::{Deserialize, Serialize};

use super::resolver::DEFAULT_WEB_PREFIX;

/// Environment variable overriding the configured server origin
pub const ORIGIN_ENV: &str = "MARKVIEW_ORIGIN";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Dataset server settings
    pub server: ServerConfig,
    /// Viewer settings
    pub viewer: ViewerConfig,
    /// UI settings
    pub ui: UiConfig,
}

/// Where datasets and PDFs are served from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Scheme, host and port, e.g. `http://localhost:5173`
    pub origin: String,
    /// Deployment base path prepended to dataset requests
    pub base_path: String,
    /// Prefix under which PDF files are served
    pub web_prefix: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Viewer-specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Dataset version opened at startup
    pub default_version: String,
    /// Marks shown per list page
    pub page_size: usize,
    /// Recently opened versions, most recent first
    pub recent_versions: Vec<String>,
}

/// UI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Theme (light/dark/system)
    pub theme: String,
    /// Mark list panel width
    pub sidebar_width: f32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:5173".to_string(),
            base_path: "/".to_string(),
            web_prefix: DEFAULT_WEB_PREFIX.to_string(),
            timeout_secs: 300,
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_version: "1".to_string(),
            page_size: 20,
            recent_versions: Vec::new(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            sidebar_width: 280.0,
        }
    }
}

impl UiConfig {
    /// Theme to apply at startup; unknown names fall back to dark
    pub fn theme_preference(&self) -> egui::ThemePreference {
        match self.theme.trim().to_ascii_lowercase().as_str() {
            "light" => egui::ThemePreference::Light,
            "system" => egui::ThemePreference::System,
            _ => egui::ThemePreference::Dark,
        }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "markview", "Markview")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from disk, then apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?
        } else {
            Self::default()
        };

        if let Ok(origin) = std::env::var(ORIGIN_ENV) {
            config.apply_origin_override(origin);
        }
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        // Ensure config directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    fn apply_origin_override(&mut self, origin: String) {
        let origin = origin.trim();
        if !origin.is_empty() {
            tracing::info!("Using origin from {}: {}", ORIGIN_ENV, origin);
            self.server.origin = origin.to_string();
        }
    }

    /// Add a version to recent versions
    pub fn add_recent_version(&mut self, version: &str) {
        // Remove if already exists
        self.viewer.recent_versions.retain(|v| v != version);
        // Add to front
        self.viewer.recent_versions.insert(0, version.to_string());
        // Keep only last 10
        self.viewer.recent_versions.truncate(10);
    }

    /// Version to open at startup: the most recent one, else the default
    pub fn startup_version(&self) -> &str {
        self.viewer
            .recent_versions
            .first()
            .map(String::as_str)
            .unwrap_or(&self.viewer.default_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_versions_dedup_and_cap() {
        let mut config = AppConfig::default();
        for n in 0..12 {
            config.add_recent_version(&n.to_string());
        }
        config.add_recent_version("5");

        assert_eq!(config.viewer.recent_versions.len(), 10);
        assert_eq!(config.viewer.recent_versions[0], "5");
        assert_eq!(
            config.viewer.recent_versions.iter().filter(|v| *v == "5").count(),
            1
        );
        assert_eq!(config.startup_version(), "5");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"server":{"origin":"http://10.0.0.2:8080"}}"#).unwrap();
        assert_eq!(config.server.origin, "http://10.0.0.2:8080");
        assert_eq!(config.server.web_prefix, "/web");
        assert_eq!(config.server.timeout_secs, 300);
        assert_eq!(config.startup_version(), "1");
    }

    #[test]
    fn test_theme_preference() {
        let mut ui = UiConfig::default();
        assert_eq!(ui.theme_preference(), egui::ThemePreference::Dark);

        ui.theme = "Light".to_string();
        assert_eq!(ui.theme_preference(), egui::ThemePreference::Light);

        ui.theme = "system".to_string();
        assert_eq!(ui.theme_preference(), egui::ThemePreference::System);

        ui.theme = "sepia".to_string();
        assert_eq!(ui.theme_preference(), egui::ThemePreference::Dark);
    }

    #[test]
    fn test_blank_origin_override_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_origin_override("   ".to_string());
        assert_eq!(config.server.origin, "http://localhost:5173");

        config.apply_origin_override("https://docs.example.com".to_string());
        assert_eq!(config.server.origin, "https://docs.example.com");
    }
}
