use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Browser user-data directory, temporary or persistent
pub struct ProfileManager {
    path: PathBuf,
    is_temporary: bool,
}

impl ProfileManager {
    /// Fresh profile deleted on drop
    pub fn temporary() -> Result<Self> {
        let path = tempfile::Builder::new()
            .prefix("formfill-profile-")
            .tempdir()?
            .keep();

        Ok(Self {
            path,
            is_temporary: true,
        })
    }

    /// Create or reuse a profile directory at `path`
    pub fn persistent(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            std::fs::create_dir_all(&path)?;
        }

        Ok(Self {
            path,
            is_temporary: false,
        })
    }

    /// Persistent profile under `~/.formfill/profiles/<name>`
    pub fn named(name: &str) -> Result<Self> {
        Self::persistent(Self::profiles_dir()?.join(Self::validate_name(name)?))
    }

    fn profiles_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Browser("Home directory not found".to_string()))?;
        Ok(home.join(".formfill").join("profiles"))
    }

    fn validate_name(name: &str) -> Result<&str> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(name)
        } else {
            Err(Error::Browser(format!(
                "Invalid profile name '{}': use letters, digits, '-' and '_'",
                name
            )))
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.is_temporary
    }
}

impl Drop for ProfileManager {
    fn drop(&mut self) {
        if self.is_temporary && self.path.exists() {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}
