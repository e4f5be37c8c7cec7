//! CLI command implementations.

mod ask;
mod config;
mod doctor;
mod serve;
mod session;
mod transcribe;

pub use ask::run_ask;
pub use config::run_config;
pub use doctor::run_doctor;
pub use serve::run_serve;
pub use session::run_session;
pub use transcribe::run_transcribe;
