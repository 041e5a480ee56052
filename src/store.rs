// chaintrack/src/store.rs

use chrono::Local;
use directories::ProjectDirs;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::error::{Result, StoreError};
use crate::event::{Subscription, UpdateEvent};

/// Default per-user data directory for stores opened without an explicit path.
pub fn default_data_dir() -> Result<PathBuf> {
    let proj = ProjectDirs::from("dev", "earthlings", "chaintrack").ok_or_else(|| {
        StoreError::Validation("no home directory available for default data dir".into())
    })?;
    Ok(proj.data_dir().to_path_buf())
}

/// One JSON document owned in memory and rewritten whole on every save.
///
/// Schema-unaware: the chain and todo stores wrap this with their own
/// document types. Subscribers registered on the update event are invoked
/// synchronously after each successful save.
pub struct DataFile<T> {
    path: PathBuf,
    backup_dir: PathBuf,
    data: T,
    update_event: UpdateEvent,
}

impl<T: std::fmt::Debug> std::fmt::Debug for DataFile<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataFile")
            .field("path", &self.path)
            .field("backup_dir", &self.backup_dir)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

impl<T: Serialize + DeserializeOwned> DataFile<T> {
    /// Parse the backing file if it exists; otherwise install `default` and
    /// perform an initial save (creating parent directories). A file that
    /// exists but fails to parse is a hard error, never reset to defaults.
    pub fn load(path: impl Into<PathBuf>, default: T) -> Result<Self> {
        let path = path.into();
        let backup_dir = path
            .parent()
            .unwrap_or(Path::new("."))
            .join("backups");
        let mut file = Self {
            path,
            backup_dir,
            data: default,
            update_event: UpdateEvent::new(),
        };
        if file.path.is_file() {
            let text = fs::read_to_string(&file.path)?;
            file.data = serde_json::from_str(&text).map_err(|source| StoreError::Corrupt {
                path: file.path.clone(),
                source,
            })?;
            info!(path = %file.path.display(), "loaded data");
        } else {
            file.save()?;
        }
        Ok(file)
    }

    /// Serialize the document, overwrite the backing file, then notify
    /// subscribers. Notification runs after the write has succeeded, so
    /// handler behavior never affects persistence.
    pub fn save(&mut self) -> Result<()> {
        self.write_to(&self.path)?;
        self.update_event.emit();
        Ok(())
    }

    /// Timestamped copy of the current document under the backup directory,
    /// leaving the primary path untouched. Fires the update event like any
    /// save.
    pub fn snapshot(&mut self) -> Result<PathBuf> {
        // Colons are not filesystem-safe everywhere; dots stand in.
        let stamp = Local::now().format("%Y-%m-%dT%H.%M.%S");
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "data.json".into());
        let path = self.backup_dir.join(format!("{stamp}_{name}"));
        self.snapshot_to(&path)?;
        Ok(path)
    }

    pub fn snapshot_to(&mut self, path: &Path) -> Result<()> {
        self.write_to(path)?;
        self.update_event.emit();
        Ok(())
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_string_pretty(&self.data)?)?;
        info!(path = %path.display(), "saved data");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }

    pub fn subscribe(&mut self, handler: impl FnMut() + 'static) -> Subscription {
        self.update_event.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, token: Subscription) {
        self.update_event.unsubscribe(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Doc {
        entries: Vec<String>,
    }

    #[test]
    fn missing_file_installs_default_and_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");
        let file: DataFile<Doc> = DataFile::load(&path, Doc::default()).unwrap();
        assert!(path.is_file());
        assert_eq!(file.data(), &Doc::default());
    }

    #[test]
    fn reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let mut file: DataFile<Doc> = DataFile::load(&path, Doc::default()).unwrap();
        file.data_mut().entries.push("one".into());
        file.save().unwrap();

        let reloaded: DataFile<Doc> = DataFile::load(&path, Doc::default()).unwrap();
        assert_eq!(reloaded.data().entries, vec!["one"]);
    }

    #[test]
    fn corrupt_file_is_an_error_not_a_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, "{ not json").unwrap();
        let err = DataFile::<Doc>::load(&path, Doc::default()).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        // Original bytes untouched.
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn save_notifies_subscribers() {
        let dir = tempfile::tempdir().unwrap();
        let mut file: DataFile<Doc> =
            DataFile::load(dir.path().join("doc.json"), Doc::default()).unwrap();
        let fired = Rc::new(RefCell::new(0));
        let counter = fired.clone();
        file.subscribe(move || *counter.borrow_mut() += 1);
        file.save().unwrap();
        file.save().unwrap();
        assert_eq!(*fired.borrow(), 2);
    }

    #[test]
    fn snapshot_writes_a_copy_next_to_the_primary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let mut file: DataFile<Doc> = DataFile::load(&path, Doc::default()).unwrap();
        file.data_mut().entries.push("kept".into());
        file.save().unwrap();

        let backup = file.snapshot().unwrap();
        assert!(backup.starts_with(dir.path().join("backups")));
        assert!(backup.file_name().unwrap().to_str().unwrap().ends_with("_doc.json"));
        let copy: Doc = serde_json::from_str(&fs::read_to_string(&backup).unwrap()).unwrap();
        assert_eq!(copy.entries, vec!["kept"]);
        // Primary path unchanged.
        assert_eq!(file.path(), path);
    }
}
