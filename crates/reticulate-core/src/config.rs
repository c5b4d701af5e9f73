use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::normalize::NormalizeOptions;

/// File name looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "reticulate.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub normalize: NormalizeConfig,
    #[serde(default)]
    pub essential: EssentialConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeConfig {
    #[serde(default = "default_true")]
    pub reduce_transitive: bool,
    #[serde(default = "default_true")]
    pub suppress_pass_through: bool,
    #[serde(default = "default_true")]
    pub keep_labelled_pass_through: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            reduce_transitive: default_true(),
            suppress_pass_through: default_true(),
            keep_labelled_pass_through: default_true(),
        }
    }
}

impl From<&NormalizeConfig> for NormalizeOptions {
    fn from(config: &NormalizeConfig) -> Self {
        Self {
            reduce_transitive: config.reduce_transitive,
            suppress_pass_through: config.suppress_pass_through,
            keep_labelled_pass_through: config.keep_labelled_pass_through,
        }
    }
}

/// Which internal nodes the CLI treats as essential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EssentialConfig {
    /// Keep every labelled node, not just the root and the leaves.
    #[serde(default)]
    pub keep_labelled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output mode: `pretty`, `text` or `json`.
    #[serde(default)]
    pub format: Option<String>,
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    Explicit(PathBuf),
    Project(PathBuf),
    User(PathBuf),
    Defaults,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveConfig {
    pub config: ProjectConfig,
    pub source: ConfigSource,
}

/// Parse one TOML config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML for
/// [`ProjectConfig`].
pub fn load_config_file(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load `reticulate.toml` from `project_root`; `None` if it is absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<Option<ProjectConfig>> {
    let path = project_root.join(PROJECT_CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }
    load_config_file(&path).map(Some)
}

/// Path of the per-user config file, if the platform has a config dir.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("reticulate/config.toml"))
}

/// Load the per-user defaults, if present.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<Option<ProjectConfig>> {
    let Some(path) = user_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    load_config_file(&path).map(Some)
}

/// Resolve the configuration for one invocation.
///
/// Precedence (first hit wins): `explicit` path, `reticulate.toml` in
/// `project_root`, the user config file, built-in defaults.
///
/// # Errors
///
/// Returns an error if `explicit` does not exist, or if any file that is
/// consulted fails to parse.
pub fn resolve_config(explicit: Option<&Path>, project_root: &Path) -> Result<EffectiveConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            bail!("Config file {} does not exist", path.display());
        }
        return Ok(EffectiveConfig {
            config: load_config_file(path)?,
            source: ConfigSource::Explicit(path.to_path_buf()),
        });
    }

    if let Some(config) = load_project_config(project_root)? {
        return Ok(EffectiveConfig {
            config,
            source: ConfigSource::Project(project_root.join(PROJECT_CONFIG_FILE)),
        });
    }

    if let (Some(config), Some(path)) = (load_user_config()?, user_config_path()) {
        return Ok(EffectiveConfig {
            config,
            source: ConfigSource::User(path),
        });
    }

    Ok(EffectiveConfig {
        config: ProjectConfig::default(),
        source: ConfigSource::Defaults,
    })
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_config_is_none() {
        let dir = tempfile::tempdir().expect("temp dir must be created");
        let cfg = load_project_config(dir.path()).expect("load should succeed");
        assert!(cfg.is_none());
    }

    #[test]
    fn defaults_match_normalize_options() {
        let cfg = ProjectConfig::default();
        assert_eq!(
            NormalizeOptions::from(&cfg.normalize),
            NormalizeOptions::default()
        );
        assert!(!cfg.essential.keep_labelled);
        assert_eq!(cfg.output.format, None);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("temp dir must be created");
        std::fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            "[normalize]\nsuppress_pass_through = false\n\n[essential]\nkeep_labelled = true\n",
        )
        .expect("write config");

        let cfg = load_project_config(dir.path())
            .expect("load should succeed")
            .expect("file exists");
        assert!(cfg.normalize.reduce_transitive);
        assert!(!cfg.normalize.suppress_pass_through);
        assert!(cfg.normalize.keep_labelled_pass_through);
        assert!(cfg.essential.keep_labelled);
    }

    #[test]
    fn explicit_path_wins_over_project_file() {
        let dir = tempfile::tempdir().expect("temp dir must be created");
        std::fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            "[output]\nformat = \"text\"\n",
        )
        .expect("write project config");
        let explicit = dir.path().join("other.toml");
        std::fs::write(&explicit, "[output]\nformat = \"json\"\n").expect("write explicit config");

        let effective = resolve_config(Some(&explicit), dir.path()).expect("resolve");
        assert_eq!(effective.config.output.format.as_deref(), Some("json"));
        assert_eq!(effective.source, ConfigSource::Explicit(explicit));
    }

    #[test]
    fn project_file_is_found_in_root() {
        let dir = tempfile::tempdir().expect("temp dir must be created");
        std::fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            "[normalize]\nreduce_transitive = false\n",
        )
        .expect("write config");

        let effective = resolve_config(None, dir.path()).expect("resolve");
        assert!(!effective.config.normalize.reduce_transitive);
        assert!(matches!(effective.source, ConfigSource::Project(_)));
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir must be created");
        let err = resolve_config(Some(&dir.path().join("nope.toml")), dir.path())
            .expect_err("missing file");
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().expect("temp dir must be created");
        let path = dir.path().join(PROJECT_CONFIG_FILE);
        std::fs::write(&path, "[normalize\n").expect("write config");

        let err = load_config_file(&path).expect_err("invalid toml");
        assert!(format!("{err:#}").contains("Failed to parse"));
    }
}
