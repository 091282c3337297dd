pub mod error;
mod schema;
pub mod sqlite;
pub mod store;

pub use error::{Error, Result};
pub use sqlite::{SqliteStore, default_path};
pub use store::ProfileStore;
