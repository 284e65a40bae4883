//! Error types shared across the crate.
//!
//! Lookup misses, an absent driver, and closed streams are not errors here;
//! those surface as `Option` returns or silent no-ops. `AppError` covers the
//! failures a caller has to act on: bad or unreadable configuration, a
//! backend that would not launch, and a driver registry with nothing to build.

use std::fmt::{Display, Formatter};

/// Shared crate result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Error enumeration covering the crate's failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Backend process could not be launched.
    Spawn(String),
    /// File-system or pipe I/O failure.
    Io(String),
    /// No driver could be resolved or constructed.
    Driver(String),
    /// Operation on a process channel that cannot be honored.
    Channel(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Spawn(msg) => write!(f, "spawn: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
            Self::Driver(msg) => write!(f, "driver: {msg}"),
            Self::Channel(msg) => write!(f, "channel: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
