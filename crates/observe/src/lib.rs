//! Logging setup shared by the binaries of the workspace: a `tracing`
//! subscriber with an env-filter, UTC timestamps and optional JSON output,
//! and a panic hook that reports through the same subscriber.
mod config;
pub mod panic_hook;
pub mod tracing;

pub use config::Config;
