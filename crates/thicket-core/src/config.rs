use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name of the project-level config, looked up next to the snapshot.
pub const PROJECT_CONFIG_FILE: &str = "thicket.toml";

/// Settings that change how a store assigns identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Payload fields consulted, in order, to disambiguate a colliding
    /// identifier before falling back to numeric suffixes.
    #[serde(default)]
    pub disambiguate: Vec<String>,
}

impl StoreConfig {
    #[must_use]
    pub fn with_disambiguation<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            disambiguate: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// Store section as written in a config file. Absent keys defer to the
/// next layer down.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub disambiguate: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub store: StoreSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub store: StoreSection,
}

/// Layers merged for one invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectiveConfig {
    /// `None` when no config file sets store options; callers then keep
    /// whatever the snapshot itself records.
    pub store: Option<StoreConfig>,
    /// Preferred output mode from the user config, unparsed.
    pub output: Option<String>,
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(PROJECT_CONFIG_FILE);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("thicket/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Merge user and project layers. Project values win when present.
#[must_use]
pub fn merge_store(user: &StoreSection, project: &StoreSection) -> Option<StoreConfig> {
    project
        .disambiguate
        .clone()
        .or_else(|| user.disambiguate.clone())
        .map(|disambiguate| StoreConfig { disambiguate })
}

/// Load and merge the user and project config files.
pub fn resolve_config(project_root: &Path) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    Ok(EffectiveConfig {
        store: merge_store(&user.store, &project.store),
        output: user.output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_config_uses_defaults() {
        let dir = tempfile::tempdir().expect("temp dir must be created");
        let cfg = load_project_config(dir.path()).expect("load should succeed");
        assert!(cfg.store.disambiguate.is_none());
    }

    #[test]
    fn project_config_parses_disambiguation_list() {
        let dir = tempfile::tempdir().expect("temp dir must be created");
        std::fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            "[store]\ndisambiguate = [\"type\", \"module\"]\n",
        )
        .expect("write config");

        let cfg = load_project_config(dir.path()).expect("load should succeed");
        assert_eq!(
            cfg.store.disambiguate,
            Some(vec!["type".to_string(), "module".to_string()])
        );
    }

    #[test]
    fn malformed_project_config_reports_path() {
        let dir = tempfile::tempdir().expect("temp dir must be created");
        std::fs::write(dir.path().join(PROJECT_CONFIG_FILE), "[store\n").expect("write config");

        let err = load_project_config(dir.path()).expect_err("parse should fail");
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn project_layer_wins_over_user_layer() {
        let user = StoreSection {
            disambiguate: Some(vec!["kind".to_string()]),
        };
        let project = StoreSection {
            disambiguate: Some(vec!["type".to_string()]),
        };
        assert_eq!(
            merge_store(&user, &project),
            Some(StoreConfig::with_disambiguation(["type"]))
        );
        assert_eq!(
            merge_store(&user, &StoreSection::default()),
            Some(StoreConfig::with_disambiguation(["kind"]))
        );
        assert_eq!(
            merge_store(&StoreSection::default(), &StoreSection::default()),
            None
        );
    }

    #[test]
    fn user_config_parses_output_and_store() {
        let cfg: UserConfig =
            toml::from_str("output = \"json\"\n\n[store]\ndisambiguate = [\"kind\"]\n")
                .expect("parse");
        assert_eq!(cfg.output.as_deref(), Some("json"));
        assert_eq!(cfg.store.disambiguate, Some(vec!["kind".to_string()]));
    }
}
