//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/pagebounds/pagebounds.toml`
//! 3. Local config: `<project_dir>/.pagebounds.toml`
//! 4. Environment variables: `PAGEBOUNDS_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::{ApplicationError, FormatResultExt, IoResultExt};
use crate::domain::expand_env_vars;

pub const DEFAULT_SITE_FILE: &str = "site.toml";

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub max_navigation_level: Option<usize>,
    pub site_file: Option<PathBuf>,
}

/// Unified configuration for pagebounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Deepest allowed navigation level; None (or 0) means unlimited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_navigation_level: Option<usize>,
    /// Site definition file (templates and pages)
    pub site_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_navigation_level: None,
            site_file: PathBuf::from(DEFAULT_SITE_FILE),
        }
    }
}

/// Get the XDG config directory for pagebounds.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "pagebounds").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("pagebounds.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".pagebounds.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).with_path_context("read config", path)?;
    toml::from_str(&content).config_context(path)
}

impl Settings {
    /// Expand shell variables and tilde in `site_file`.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.site_file.to_string_lossy().as_ref());
        self.site_file = PathBuf::from(expanded);
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            max_navigation_level: overlay
                .max_navigation_level
                .or(self.max_navigation_level),
            site_file: overlay
                .site_file
                .clone()
                .unwrap_or_else(|| self.site_file.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional project directory for local config. A
    ///   relative `site_file` is resolved against it.
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("loading global config {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        // 3. Local config
        if let Some(project) = project_dir {
            let local_path = local_config_path(project);
            if local_path.exists() {
                debug!("loading local config {}", local_path.display());
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        if let Some(project) = project_dir {
            if current.site_file.is_relative() {
                current.site_file = project.join(&current.site_file);
            }
        }

        Ok(current)
    }

    /// Apply PAGEBOUNDS_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("PAGEBOUNDS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        match config.get::<usize>("max_navigation_level") {
            Ok(val) => settings.max_navigation_level = Some(val),
            Err(ConfigError::NotFound(_)) => {}
            Err(e) => return Err(config_err(e)),
        }
        if let Ok(val) = config.get_string("site_file") {
            settings.site_file = PathBuf::from(val);
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# pagebounds configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/pagebounds/pagebounds.toml
#   Local:  <project_dir>/.pagebounds.toml
#   Env:    PAGEBOUNDS_* environment variables

# Deepest navigation level pages may be created at (unset or 0 = unlimited)
# max_navigation_level = 3

# Site definition with templates and pages (relative to the project dir)
# site_file = "site.toml"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_config_when_loading_then_uses_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.max_navigation_level, None);
        assert_eq!(settings.site_file, PathBuf::from("site.toml"));
    }

    #[test]
    fn given_overlay_when_merging_then_specified_values_win() {
        let base = Settings {
            max_navigation_level: Some(5),
            site_file: PathBuf::from("base.toml"),
        };

        let merged = base.merge_with(&RawSettings {
            max_navigation_level: Some(3),
            site_file: None,
        });

        assert_eq!(merged.max_navigation_level, Some(3));
        assert_eq!(merged.site_file, PathBuf::from("base.toml"));
    }

    #[test]
    fn given_empty_overlay_when_merging_then_keeps_base() {
        let base = Settings {
            max_navigation_level: Some(4),
            site_file: PathBuf::from("base.toml"),
        };

        assert_eq!(base.merge_with(&RawSettings::default()), base);
    }

    #[test]
    fn given_tilde_in_site_file_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            max_navigation_level: None,
            site_file: PathBuf::from("~/sites/site.toml"),
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        assert!(
            settings.site_file.to_string_lossy().starts_with(&home),
            "site_file should start with home dir: {}",
            settings.site_file.display()
        );
    }

    #[test]
    fn given_settings_when_rendering_toml_then_omits_unset_depth() {
        let toml = Settings::default().to_toml().unwrap();
        assert!(toml.contains("site_file"));
        assert!(!toml.contains("max_navigation_level"));
    }

    #[test]
    fn given_template_when_parsing_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert_eq!(raw.max_navigation_level, None);
    }
}
