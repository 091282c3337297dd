use crate::{BrowserKind, Error, Result};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

pub const DEFAULT_DEBUG_PORT: u16 = 9222;

/// Add `https://` to scheme-less URLs; `about:blank` when none is given
pub fn normalize_url(url: Option<&str>) -> String {
    let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
        return "about:blank".to_string();
    };

    let has_scheme = url.contains("://") || url.starts_with("about:") || url.starts_with("data:");
    if has_scheme {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Spawns a browser with its DevTools debugging port open
pub struct BrowserLauncher {
    kind: BrowserKind,
    binary: PathBuf,
    profile_path: PathBuf,
    initial_url: Option<String>,
    debugging_port: u16,
}

impl BrowserLauncher {
    pub fn new(
        kind: BrowserKind,
        binary: PathBuf,
        profile_path: PathBuf,
        initial_url: Option<String>,
    ) -> Self {
        Self {
            kind,
            binary,
            profile_path,
            initial_url,
            debugging_port: DEFAULT_DEBUG_PORT,
        }
    }

    pub fn with_debugging_port(mut self, port: u16) -> Self {
        self.debugging_port = port;
        self
    }

    pub fn launch(&self) -> Result<Child> {
        let args = self.build_args();
        tracing::debug!("Launching {} {}", self.binary.display(), args.join(" "));

        Command::new(&self.binary)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Browser(format!("Failed to launch {}: {}", self.kind, e)))
    }

    fn build_args(&self) -> Vec<String> {
        let mut args = if self.kind.is_chromium_based() {
            vec![
                format!("--remote-debugging-port={}", self.debugging_port),
                "--no-first-run".to_string(),
                "--no-default-browser-check".to_string(),
                format!("--user-data-dir={}", self.profile_path.display()),
            ]
        } else {
            vec![
                format!("--remote-debugging-port={}", self.debugging_port),
                "-no-remote".to_string(),
                "-new-instance".to_string(),
                "-profile".to_string(),
                self.profile_path.display().to_string(),
            ]
        };

        args.push(normalize_url(self.initial_url.as_deref()));
        args
    }

    pub fn debugging_port(&self) -> u16 {
        self.debugging_port
    }
}
