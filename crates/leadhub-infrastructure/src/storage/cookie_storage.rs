//! Persisted session cookie.
//!
//! The CLI is one process per command, so the session cookie set by
//! `login` has to outlive the process. It is stored as a `Cookie` header
//! value in a file only the owner can read.

use std::fs;
use std::path::{Path, PathBuf};

use leadhub_core::Result;

#[derive(Debug, Clone)]
pub struct CookieFile {
    path: PathBuf,
}

impl CookieFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored cookies, or `None` if nothing was saved.
    pub fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let content = content.trim();
        Ok((!content.is_empty()).then(|| content.to_string()))
    }

    pub fn save(&self, cookies: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("cookie.tmp");
        fs::write(&tmp_path, cookies)?;

        // Set file permissions to 600 (user read/write only) on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
        }

        fs::rename(&tmp_path, &self.path)?;
        tracing::debug!("[CookieFile] Saved session to {}", self.path.display());
        Ok(())
    }

    /// Removes the stored session; a missing file is not an error.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_load_clear() {
        let temp_dir = TempDir::new().unwrap();
        let file = CookieFile::new(temp_dir.path().join("session.cookie"));

        assert_eq!(file.load().unwrap(), None);
        file.save("token=abc").unwrap();
        assert_eq!(file.load().unwrap().as_deref(), Some("token=abc"));

        file.clear().unwrap();
        assert_eq!(file.load().unwrap(), None);
        file.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_cookie_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let file = CookieFile::new(temp_dir.path().join("nested").join("session.cookie"));
        file.save("token=abc").unwrap();

        let mode = fs::metadata(file.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
