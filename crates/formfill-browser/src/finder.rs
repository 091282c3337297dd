use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Browsers that expose a DevTools-protocol debugging port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowserKind {
    #[default]
    Chrome,
    Chromium,
    Edge,
    /// Firefox speaks the protocol only partially; newer releases may not
    /// expose it at all
    Firefox,
}

impl BrowserKind {
    pub const ALL: [BrowserKind; 4] = [
        BrowserKind::Chrome,
        BrowserKind::Chromium,
        BrowserKind::Edge,
        BrowserKind::Firefox,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chrome => "chrome",
            BrowserKind::Chromium => "chromium",
            BrowserKind::Edge => "edge",
            BrowserKind::Firefox => "firefox",
        }
    }

    pub fn is_chromium_based(&self) -> bool {
        !matches!(self, BrowserKind::Firefox)
    }

    /// Executable names looked up on `PATH`
    fn binary_names(&self) -> &'static [&'static str] {
        match self {
            BrowserKind::Chrome => &["google-chrome", "google-chrome-stable", "chrome"],
            BrowserKind::Chromium => &["chromium", "chromium-browser"],
            BrowserKind::Edge => &["microsoft-edge", "microsoft-edge-stable", "msedge"],
            BrowserKind::Firefox => &["firefox"],
        }
    }

    /// Platform-specific install locations
    fn default_paths(&self) -> Vec<PathBuf> {
        #[cfg(target_os = "macos")]
        let paths: &[&str] = match self {
            BrowserKind::Chrome => &["/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"],
            BrowserKind::Chromium => &["/Applications/Chromium.app/Contents/MacOS/Chromium"],
            BrowserKind::Edge => &["/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge"],
            BrowserKind::Firefox => &[
                "/Applications/Firefox.app/Contents/MacOS/firefox",
                "/Applications/Firefox Developer Edition.app/Contents/MacOS/firefox",
                "/Applications/Firefox Nightly.app/Contents/MacOS/firefox",
            ],
        };

        #[cfg(target_os = "linux")]
        let paths: &[&str] = match self {
            BrowserKind::Chrome => &["/usr/bin/google-chrome", "/usr/bin/google-chrome-stable"],
            BrowserKind::Chromium => &[
                "/usr/bin/chromium",
                "/usr/bin/chromium-browser",
                "/snap/bin/chromium",
            ],
            BrowserKind::Edge => &["/usr/bin/microsoft-edge", "/usr/bin/microsoft-edge-stable"],
            BrowserKind::Firefox => &[
                "/usr/bin/firefox",
                "/usr/lib/firefox/firefox",
                "/snap/bin/firefox",
            ],
        };

        #[cfg(target_os = "windows")]
        let paths: &[&str] = match self {
            BrowserKind::Chrome => &[
                r"C:\Program Files\Google\Chrome\Application\chrome.exe",
                r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            ],
            BrowserKind::Chromium => &[r"C:\Program Files\Chromium\Application\chrome.exe"],
            BrowserKind::Edge => &[
                r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
                r"C:\Program Files\Microsoft\Edge\Application\msedge.exe",
            ],
            BrowserKind::Firefox => &[
                r"C:\Program Files\Mozilla Firefox\firefox.exe",
                r"C:\Program Files (x86)\Mozilla Firefox\firefox.exe",
            ],
        };

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        let paths: &[&str] = &[];

        paths.iter().map(PathBuf::from).collect()
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowserKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "chrome" | "google-chrome" => Ok(BrowserKind::Chrome),
            "chromium" => Ok(BrowserKind::Chromium),
            "edge" | "msedge" => Ok(BrowserKind::Edge),
            "firefox" => Ok(BrowserKind::Firefox),
            other => Err(Error::Browser(format!(
                "Unsupported browser '{}'. Expected one of: chrome, chromium, edge, firefox",
                other
            ))),
        }
    }
}

/// Locates a browser binary on the system
pub struct BrowserFinder {
    kind: BrowserKind,
    custom_path: Option<PathBuf>,
}

impl BrowserFinder {
    pub fn new(kind: BrowserKind, custom_path: Option<PathBuf>) -> Self {
        Self { kind, custom_path }
    }

    /// Custom path first, then install locations, then `PATH`
    pub fn find(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.custom_path {
            return self.validate_path(path);
        }

        let default_paths = self.kind.default_paths();
        for path in &default_paths {
            if let Ok(valid_path) = self.validate_path(path) {
                tracing::debug!("Found {} at {}", self.kind, valid_path.display());
                return Ok(valid_path);
            }
        }

        for name in self.kind.binary_names() {
            if let Ok(path) = which::which(name) {
                if let Ok(valid_path) = self.validate_path(&path) {
                    tracing::debug!("Found {} on PATH: {}", self.kind, valid_path.display());
                    return Ok(valid_path);
                }
            }
        }

        Err(Error::Browser(format!(
            "{} not found. Checked: {}. Use --browser-path to specify location.",
            self.kind,
            default_paths
                .iter()
                .map(|p| p.display().to_string())
                .chain(self.kind.binary_names().iter().map(|n| n.to_string()))
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }

    /// Path must exist and be executable
    fn validate_path(&self, path: &Path) -> Result<PathBuf> {
        if !path.exists() {
            return Err(Error::Browser(format!(
                "{} not found at: {}",
                self.kind,
                path.display()
            )));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = std::fs::metadata(path)?;
            if metadata.permissions().mode() & 0o111 == 0 {
                return Err(Error::Browser(format!(
                    "{} binary not executable: {}",
                    self.kind,
                    path.display()
                )));
            }
        }

        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finder_uses_custom_path() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let path = temp.path();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let finder = BrowserFinder::new(BrowserKind::Chromium, Some(path.to_path_buf()));
        assert_eq!(finder.find().unwrap(), path);
    }

    #[test]
    fn test_finder_fails_for_missing_custom_path() {
        let finder = BrowserFinder::new(BrowserKind::Edge, Some(PathBuf::from("/nonexistent/edge")));
        let err = finder.find().unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[cfg(unix)]
    #[test]
    fn test_finder_rejects_non_executable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::set_permissions(temp.path(), std::fs::Permissions::from_mode(0o644)).unwrap();

        let finder = BrowserFinder::new(BrowserKind::Chrome, Some(temp.path().to_path_buf()));
        assert!(finder.find().unwrap_err().to_string().contains("not executable"));
    }

    #[test]
    fn test_parse_browser_kind() {
        for kind in BrowserKind::ALL {
            assert_eq!(kind.as_str().parse::<BrowserKind>().unwrap(), kind);
        }
        assert_eq!("MSEdge".parse::<BrowserKind>().unwrap(), BrowserKind::Edge);
        assert!("safari".parse::<BrowserKind>().is_err());
    }

    #[test]
    fn test_only_firefox_is_not_chromium_based() {
        assert!(BrowserKind::Edge.is_chromium_based());
        assert!(!BrowserKind::Firefox.is_chromium_based());
    }
}
