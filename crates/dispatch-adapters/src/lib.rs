//! Process-backed implementations of the dispatch ports, plus the
//! environment configuration and logging setup used by the binaries.

pub mod config;
pub mod inference;
pub mod probe;
pub mod shell;
pub mod telemetry;

pub use config::AppConfig;
pub use inference::LlmInference;
pub use probe::PathProbe;
pub use shell::ProcessShell;
pub use telemetry::init_tracing;
