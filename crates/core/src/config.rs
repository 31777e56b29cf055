use serde::{Deserialize, Serialize};

/// Target number of folder picks per session. The current production value;
/// earlier deployments ran with 4 and 5.
pub const DEFAULT_MAX_SELECT: usize = 7;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub provider: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            provider: "memory".to_string(),
            project_id: None,
            bucket: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Upper bound on folders assigned to one session.
    #[serde(default = "default_max_select")]
    pub max_select: usize,
    /// Dataset names never offered to participants.
    #[serde(default)]
    pub excluded_datasets: Vec<String>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_select: DEFAULT_MAX_SELECT,
            excluded_datasets: Vec::new(),
        }
    }
}

fn default_max_select() -> usize {
    DEFAULT_MAX_SELECT
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub password: Option<String>,
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_full_config_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("survey.toml");
        fs::write(
            &path,
            r#"
            [store]
            provider = "firebase"
            project_id = "demo-project"
            bucket = "demo-project.appspot.com"

            [selection]
            max_select = 5
            excluded_datasets = ["Zoom_Class_Meeting-clean"]

            [admin]
            password = "hunter2"
            "#,
        )
        .unwrap();

        let cfg = load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(cfg.store.provider, "firebase");
        assert_eq!(cfg.selection.max_select, 5);
        assert_eq!(cfg.selection.excluded_datasets.len(), 1);
        assert_eq!(cfg.admin.password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("survey.toml");
        fs::write(&path, "[store]\nprovider = \"memory\"\n").unwrap();

        let cfg = load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(cfg.selection.max_select, DEFAULT_MAX_SELECT);
        assert!(cfg.selection.excluded_datasets.is_empty());
        assert!(cfg.admin.password.is_none());
    }
}
