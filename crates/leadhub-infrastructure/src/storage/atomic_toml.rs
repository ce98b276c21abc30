//! Atomic TOML files: temp file + fsync + rename, with an exclusive lock
//! around read-modify-write updates.

use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use leadhub_core::{HubError, Result};
use serde::{Serialize, de::DeserializeOwned};

/// A typed TOML file that is never observed half-written.
pub struct AtomicTomlFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicTomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file; `None` when it is missing or empty.
    pub fn load(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(toml::from_str(&content)?))
    }

    /// Writes `data` to a sibling temp file, syncs it and renames it over
    /// the target.
    pub fn save(&self, data: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(data)?;

        let tmp_path = temp_path(&self.path)?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        tracing::debug!("[AtomicTomlFile] Saved {}", self.path.display());
        Ok(())
    }

    /// Read-modify-write under an exclusive lock.
    ///
    /// `default_value` seeds the update when the file does not exist yet.
    /// Nothing is written if `f` fails.
    pub fn update<F>(&self, default_value: T, f: F) -> Result<T>
    where
        F: FnOnce(&mut T) -> Result<()>,
    {
        let _lock = FileLock::acquire(&self.path)?;

        let mut data = self.load()?.unwrap_or(default_value);
        f(&mut data)?;
        self.save(&data)?;

        Ok(data)
    }
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let parent = path
        .parent()
        .ok_or_else(|| HubError::io(format!("{} has no parent directory", path.display())))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| HubError::io(format!("{} has no file name", path.display())))?;
    Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
}

/// Exclusive lock on `<file>.lock`, released and removed on drop.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| HubError::io(format!("Failed to acquire lock: {}", e)))?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadhub_core::config::ClientConfig;
    use tempfile::TempDir;

    fn file_in(dir: &TempDir) -> AtomicTomlFile<ClientConfig> {
        AtomicTomlFile::new(dir.path().join("config.toml"))
    }

    #[test]
    fn test_missing_and_empty_files_load_as_none() {
        let temp_dir = TempDir::new().unwrap();
        let file = file_in(&temp_dir);
        assert!(file.load().unwrap().is_none());

        fs::write(file.path(), "  \n").unwrap();
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = file_in(&temp_dir);
        file.save(&ClientConfig {
            api_url: "http://localhost:4000".into(),
            timeout_secs: Some(5),
        })
        .unwrap();

        assert!(!temp_dir.path().join(".config.toml.tmp").exists());
        let loaded = file.load().unwrap().unwrap();
        assert_eq!(loaded.timeout_secs, Some(5));
    }

    #[test]
    fn test_update_seeds_default_and_removes_lock() {
        let temp_dir = TempDir::new().unwrap();
        let file = file_in(&temp_dir);

        let updated = file
            .update(ClientConfig::default(), |config| {
                config.timeout_secs = Some(30);
                Ok(())
            })
            .unwrap();
        assert_eq!(updated.api_url, ClientConfig::default().api_url);
        assert_eq!(file.load().unwrap().unwrap().timeout_secs, Some(30));
        assert!(!temp_dir.path().join("config.lock").exists());
    }

    #[test]
    fn test_failed_update_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let file = file_in(&temp_dir);

        let result = file.update(ClientConfig::default(), |_| Err(HubError::config("nope")));
        assert!(result.is_err());
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_malformed_file_is_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let file = file_in(&temp_dir);
        fs::write(file.path(), "api_url = [").unwrap();
        assert!(matches!(file.load(), Err(HubError::Serialization { .. })));
    }
}
