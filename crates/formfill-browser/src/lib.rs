// Browser driver: finds and launches a browser, then fills forms over the DevTools protocol

mod action;
mod error;
mod filler;
mod finder;
mod launcher;
mod profile;
mod scanner;
mod session;
mod values;

pub use action::{FillAction, InputKind, plan_action};
pub use error::{Error, Result};
pub use filler::{FillStats, Filler, FillerConfig, FormPage};
pub use finder::{BrowserFinder, BrowserKind};
pub use launcher::{BrowserLauncher, DEFAULT_DEBUG_PORT, normalize_url};
pub use profile::ProfileManager;
pub use scanner::{ScannedField, ScannedOption};
pub use session::DevToolsSession;
pub use values::{ProfileValues, RandomValues, ValueGenerator};
