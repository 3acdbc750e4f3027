pub mod config;
pub mod error;
pub mod logger;
pub mod nbt;
pub mod protocol;
pub mod server;
pub mod session;
pub mod session_manager;
pub mod types;
pub mod world;

// Re-export commonly used items
pub use config::ServerConfig;
pub use error::{CobbleError, Result};
pub use logger::{log, LogSeverity};
pub use protocol::packet::Packet;
