//! Persisted settings store.
//!
//! One JSON file holds a map of namespace → persisted settings, so
//! multiple calendars (per team) share the file without clobbering each
//! other. Load failures degrade to defaults; only saves surface errors.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use crate::models::settings::PersistedSettings;

const SETTINGS_FILE: &str = "settings.json";

type SettingsMap = BTreeMap<String, PersistedSettings>;

pub struct SettingsStore {
    path: PathBuf,
    namespace: String,
}

impl SettingsStore {
    /// Store under the platform config directory. The namespace keys this
    /// calendar's slot in the shared file; the team name is the usual
    /// choice.
    pub fn open(namespace: impl Into<String>) -> Result<Self> {
        let dirs = ProjectDirs::from("com", "OncallCalendar", "OncallCalendar")
            .context("Failed to resolve a config directory")?;
        let dir = dirs.config_dir();
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
        Ok(Self {
            path: dir.join(SETTINGS_FILE),
            namespace: namespace.into(),
        })
    }

    /// Store at an explicit path.
    pub fn at_path(path: PathBuf, namespace: impl Into<String>) -> Self {
        Self {
            path,
            namespace: namespace.into(),
        }
    }

    /// Read this namespace's settings. A missing file or unreadable
    /// content yields defaults; corrupt settings must never block startup.
    pub fn load(&self) -> PersistedSettings {
        match self.read_map() {
            Ok(map) => map.get(&self.namespace).cloned().unwrap_or_default(),
            Err(err) => {
                log::warn!(
                    "Failed to load settings from {}: {err:#}, using defaults",
                    self.path.display()
                );
                PersistedSettings::default()
            }
        }
    }

    /// Write this namespace's settings, preserving other namespaces.
    /// Saving an empty settings value removes the key instead.
    pub fn save(&self, settings: &PersistedSettings) -> Result<()> {
        let mut map = self.read_map().unwrap_or_default();
        if settings.is_empty() {
            map.remove(&self.namespace);
        } else {
            map.insert(self.namespace.clone(), settings.clone());
        }
        self.write_map(&map)
    }

    /// Drop this namespace entirely; the next load falls back to defaults.
    pub fn clear(&self) -> Result<()> {
        let mut map = self.read_map().unwrap_or_default();
        if map.remove(&self.namespace).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }

    fn read_map(&self) -> Result<SettingsMap> {
        if !self.path.exists() {
            return Ok(SettingsMap::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    fn write_map(&self, map: &SettingsMap) -> Result<()> {
        let content = serde_json::to_string_pretty(map).context("Failed to encode settings")?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::settings::ViewType;
    use tempfile::TempDir;

    fn store(dir: &TempDir, namespace: &str) -> SettingsStore {
        SettingsStore::at_path(dir.path().join("settings.json"), namespace)
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(store(&dir, "team-a").load(), PersistedSettings::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, "team-a");
        let settings = PersistedSettings {
            current_view: Some(ViewType::Week),
            visible_roles: Some(vec!["primary".to_string()]),
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn test_namespaces_do_not_clobber_each_other() {
        let dir = TempDir::new().unwrap();
        let a = store(&dir, "team-a");
        let b = store(&dir, "team-b");
        a.save(&PersistedSettings {
            current_view: Some(ViewType::Template),
            visible_roles: None,
        })
        .unwrap();
        b.save(&PersistedSettings {
            current_view: Some(ViewType::Week),
            visible_roles: None,
        })
        .unwrap();

        assert_eq!(a.load().current_view, Some(ViewType::Template));
        assert_eq!(b.load().current_view, Some(ViewType::Week));
    }

    #[test]
    fn test_clear_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, "team-a");
        store
            .save(&PersistedSettings {
                current_view: Some(ViewType::Week),
                visible_roles: None,
            })
            .unwrap();
        store.clear().unwrap();
        assert_eq!(store.load(), PersistedSettings::default());
    }

    #[test]
    fn test_saving_empty_settings_removes_key() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, "team-a");
        store
            .save(&PersistedSettings {
                current_view: Some(ViewType::Week),
                visible_roles: None,
            })
            .unwrap();
        store.save(&PersistedSettings::default()).unwrap();
        let raw = std::fs::read_to_string(dir.path().join("settings.json")).unwrap();
        assert!(!raw.contains("team-a"));
    }

    #[test]
    fn test_corrupt_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("settings.json"), "not json").unwrap();
        assert_eq!(store(&dir, "team-a").load(), PersistedSettings::default());
    }
}
