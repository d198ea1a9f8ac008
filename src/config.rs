use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    #[default]
    Default,
    Granted,
    Denied,
}

impl Permission {
    pub fn label(&self) -> &'static str {
        match self {
            Permission::Default => "not requested",
            Permission::Granted => "granted",
            Permission::Denied => "denied",
        }
    }
}

/// User settings kept next to the record files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub notifications: Permission,
    pub cycles_shown: usize,
    pub journal_shown: usize,
    pub reminders_shown: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            notifications: Permission::Default,
            cycles_shown: 6,
            journal_shown: 10,
            reminders_shown: 10,
        }
    }
}

impl Settings {
    /// Reads settings, falling back to defaults when the file is missing or unreadable.
    pub fn load(path: &Path) -> Settings {
        let Ok(data) = fs::read_to_string(path) else {
            return Settings::default();
        };
        serde_yaml::from_str::<Option<Settings>>(&data)
            .unwrap_or_else(|err| {
                tracing::debug!(
                    path = %path.display(),
                    error = %err,
                    "corrupt settings, using defaults"
                );
                None
            })
            .unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
        }
        let serialized = serde_yaml::to_string(self).context("serializing settings")?;
        fs::write(path, serialized).with_context(|| format!("writing {:?}", path))?;
        Ok(())
    }
}
