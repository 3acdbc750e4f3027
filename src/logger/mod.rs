pub mod log;
pub mod severity;
pub mod time;

pub use log::{log, set_level};
pub use severity::LogSeverity;
