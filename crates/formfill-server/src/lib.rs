pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;

pub use config::{DEFAULT_HOST, DEFAULT_PORT, ServerConfig};
pub use error::{Error, Result};
pub use router::{ApiState, build_router};
pub use server::ApiServer;
