#![forbid(unsafe_code)]

//! Debugger-session controller.
//!
//! Drives an external text-protocol debugger backend (GDB- or CDB-style)
//! over pipes and keeps the authoritative breakpoint set independent of the
//! backend's own state.

pub mod breakpoints;
pub mod channel;
pub mod config;
pub mod driver;
pub mod errors;
pub mod models;
pub mod observer;
pub mod session;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
