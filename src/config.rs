//! Global configuration parsing and validation.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::driver::Dialect;
use crate::{AppError, Result};

/// Launch settings for one backend executable.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BackendConfig {
    /// Debugger binary, resolved through `PATH` when not absolute.
    pub executable: String,
    /// Arguments placed between the executable and the debuggee.
    #[serde(default)]
    pub args: Vec<String>,
}

impl BackendConfig {
    fn new(executable: &str, args: &[&str]) -> Self {
        Self {
            executable: executable.to_owned(),
            args: args.iter().map(|&a| a.to_owned()).collect(),
        }
    }
}

fn default_gdb() -> BackendConfig {
    BackendConfig::new("gdb", &["-nx", "-fullname", "-quiet", "-args"])
}

fn default_cdb() -> BackendConfig {
    BackendConfig::new("cdb", &["-G", "-lines"])
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_idle_interval_ms() -> u64 {
    100
}

fn default_drain_grace_ms() -> u64 {
    500
}

/// Global configuration parsed from a TOML file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Dialect for absent or unknown backend tokens.
    ///
    /// `None` means [`Dialect::platform_default`].
    #[serde(default)]
    pub default_dialect: Option<Dialect>,
    /// Directory backends are launched in.
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,
    /// Aggregate un-terminated fragments until a full line arrives.
    #[serde(default)]
    pub multiline: bool,
    /// Period of the backup wake timer that drives input polling.
    #[serde(default = "default_idle_interval_ms")]
    pub idle_interval_ms: u64,
    /// How long to wait for output pipes to close after the backend exits.
    #[serde(default = "default_drain_grace_ms")]
    pub drain_grace_ms: u64,
    /// GDB launch settings.
    #[serde(default = "default_gdb")]
    pub gdb: BackendConfig,
    /// CDB launch settings.
    #[serde(default = "default_cdb")]
    pub cdb: BackendConfig,
    /// Extra backend tokens, e.g. `msvctk = "cdb"`.
    #[serde(default)]
    pub aliases: HashMap<String, Dialect>,
    /// Extra environment variables for launched backends.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            default_dialect: None,
            working_dir: default_working_dir(),
            multiline: false,
            idle_interval_ms: default_idle_interval_ms(),
            drain_grace_ms: default_drain_grace_ms(),
            gdb: default_gdb(),
            cdb: default_cdb(),
            aliases: HashMap::new(),
            env: HashMap::new(),
        }
    }
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the file cannot be read, or
    /// `AppError::Config` if it contains invalid TOML or fails validation.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and normalize paths.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Dialect for absent or unknown backend tokens.
    #[must_use]
    pub fn effective_default_dialect(&self) -> Dialect {
        self.default_dialect
            .unwrap_or_else(Dialect::platform_default)
    }

    /// Launch settings for a built-in dialect.
    #[must_use]
    pub fn backend(&self, dialect: Dialect) -> &BackendConfig {
        match dialect {
            Dialect::Gdb => &self.gdb,
            Dialect::Cdb => &self.cdb,
        }
    }

    /// Backup wake timer period.
    #[must_use]
    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    /// Pipe drain grace period after backend exit.
    #[must_use]
    pub fn drain_grace(&self) -> Duration {
        Duration::from_millis(self.drain_grace_ms)
    }

    /// Validate settings and canonicalize `working_dir`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` on the first invalid setting.
    pub fn validate(&mut self) -> Result<()> {
        if self.idle_interval_ms == 0 {
            return Err(AppError::Config(
                "idle_interval_ms must be greater than zero".into(),
            ));
        }

        for (name, backend) in [("gdb", &self.gdb), ("cdb", &self.cdb)] {
            if backend.executable.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "{name}.executable must not be empty"
                )));
            }
        }

        let canonical = self
            .working_dir
            .canonicalize()
            .map_err(|err| AppError::Config(format!("working_dir invalid: {err}")))?;
        self.working_dir = canonical;

        Ok(())
    }
}
