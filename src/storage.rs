use crate::model::{Namespace, Record};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const PROJECT_DIR: &str = ".bloom";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreScope {
    Project,
    Global,
}

impl StoreScope {
    pub fn label(&self) -> &'static str {
        match self {
            StoreScope::Project => "project",
            StoreScope::Global => "global",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreLocation {
    pub dir: PathBuf,
    pub scope: StoreScope,
}

impl StoreLocation {
    pub fn settings_path(&self) -> PathBuf {
        self.dir.join("settings.yml")
    }
}

pub fn init_project_store() -> Result<StoreLocation> {
    let cwd = env::current_dir()?;
    let dir = cwd.join(PROJECT_DIR);
    fs::create_dir_all(&dir).context("failed to create .bloom directory")?;
    Ok(StoreLocation {
        dir,
        scope: StoreScope::Project,
    })
}

pub fn locate_store(start: &Path) -> Result<StoreLocation> {
    if let Some(dir) = find_project_store(start) {
        return Ok(StoreLocation {
            dir,
            scope: StoreScope::Project,
        });
    }
    Ok(StoreLocation {
        dir: global_store_dir()?,
        scope: StoreScope::Global,
    })
}

/// Record sequences kept as one YAML file per namespace, most-recent-first.
///
/// Every write replaces the whole sequence. Nothing caps how many records a
/// namespace holds; callers only ever display a prefix.
#[derive(Debug, Clone)]
pub struct RecordStore {
    location: StoreLocation,
}

impl RecordStore {
    pub fn open(location: StoreLocation) -> Self {
        RecordStore { location }
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Loads every record under `R`'s namespace. A missing, unreadable or
    /// unparseable file reads as an empty sequence.
    pub fn load<R: Record>(&self) -> Vec<R> {
        let path = self.path(R::NAMESPACE);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                tracing::debug!(
                    path = %path.display(),
                    error = %err,
                    "unreadable namespace, treating as empty"
                );
                return Vec::new();
            }
        };
        match serde_yaml::from_str::<Option<Vec<R>>>(&data) {
            Ok(records) => records.unwrap_or_default(),
            Err(err) => {
                tracing::debug!(
                    path = %path.display(),
                    error = %err,
                    "corrupt namespace, treating as empty"
                );
                Vec::new()
            }
        }
    }

    pub fn save<R: Record>(&self, records: &[R]) -> Result<()> {
        let path = self.path(R::NAMESPACE);
        fs::create_dir_all(&self.location.dir)
            .with_context(|| format!("creating {:?}", self.location.dir))?;
        let serialized = serde_yaml::to_string(records)
            .with_context(|| format!("serializing {}", R::NAMESPACE.key()))?;
        fs::write(&path, serialized).with_context(|| format!("writing {:?}", path))?;
        Ok(())
    }

    pub fn clear(&self, namespace: Namespace) -> Result<()> {
        let path = self.path(namespace);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("removing {:?}", path)),
        }
    }

    fn path(&self, namespace: Namespace) -> PathBuf {
        self.location.dir.join(format!("{}.yml", namespace.key()))
    }
}

fn find_project_store(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(PROJECT_DIR);
        if candidate.is_dir() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

fn global_store_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "bloom").context("locating data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

#[cfg(test)]
pub(crate) fn temp_store(dir: &Path) -> RecordStore {
    RecordStore::open(StoreLocation {
        dir: dir.join(PROJECT_DIR),
        scope: StoreScope::Project,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CycleRecord, JournalEntry, ReminderEntry};
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn cycle(day: u32) -> CycleRecord {
        let last_start = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        CycleRecord {
            last_start,
            avg_cycle_length_days: 28,
            period_length_days: 5,
            predicted_next_start: last_start + Duration::days(28),
            predicted_next_end: last_start + Duration::days(33),
            created_at: Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn missing_namespace_loads_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = temp_store(tmp.path());
        assert!(store.load::<CycleRecord>().is_empty());
    }

    #[test]
    fn saved_sequence_loads_back_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let store = temp_store(tmp.path());
        let records = vec![cycle(20), cycle(1)];
        store.save(&records).unwrap();
        assert_eq!(store.load::<CycleRecord>(), records);
    }

    #[test]
    fn corrupt_namespace_loads_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = temp_store(tmp.path());
        store.save(&[cycle(1)]).unwrap();
        fs::write(store.path(Namespace::Cycles), "{ not: [valid").unwrap();
        assert!(store.load::<CycleRecord>().is_empty());

        fs::write(store.path(Namespace::Journal), "- just a string\n").unwrap();
        assert!(store.load::<JournalEntry>().is_empty());
    }

    #[test]
    fn clear_wipes_only_its_namespace() {
        let tmp = tempfile::tempdir().unwrap();
        let store = temp_store(tmp.path());
        let now = Utc::now();
        store.save(&[cycle(1)]).unwrap();
        store
            .save(&[ReminderEntry {
                text: "water plants".into(),
                due_at: now,
                created_at: now,
            }])
            .unwrap();

        store.clear(Namespace::Cycles).unwrap();
        assert!(store.load::<CycleRecord>().is_empty());
        assert_eq!(store.load::<ReminderEntry>().len(), 1);

        // clearing twice is fine
        store.clear(Namespace::Cycles).unwrap();
    }

    #[test]
    fn locate_prefers_nearest_project_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(tmp.path().join(PROJECT_DIR)).unwrap();
        let location = locate_store(&nested).unwrap();
        assert_eq!(location.scope, StoreScope::Project);
        assert_eq!(location.dir, tmp.path().join(PROJECT_DIR));
    }
}
