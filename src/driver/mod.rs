//! Protocol-agnostic debugger driver abstraction.
//!
//! The [`DebuggerDriver`] trait decouples the breakpoint registry and the
//! session controller from the textual protocol a backend speaks. Concrete
//! dialects (GDB, CDB) only differ in the command lines they queue; nothing
//! outside this module names a concrete driver type.
//!
//! Drivers never touch the backend process. They queue protocol lines in a
//! [`CommandQueue`] and the owner flushes them through the process channel.
//!
//! Dialect selection goes through [`DriverRegistry`], a token → factory map,
//! so adding a backend does not mean editing a dispatch branch.

pub mod cdb_driver;
pub mod command_queue;
pub mod gdb_driver;

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::GlobalConfig;
use crate::models::breakpoint::Breakpoint;
use crate::{AppError, Result};

pub use cdb_driver::CdbDriver;
pub use command_queue::CommandQueue;
pub use gdb_driver::GdbDriver;

/// Interface between the session core and one backend protocol dialect.
pub trait DebuggerDriver: Send {
    /// Dialect name, e.g. `gdb`.
    fn name(&self) -> &'static str;

    /// Build the command line that launches this backend against `target`.
    fn command_line(&self, executable: &str, args: &[String], target: &str) -> String;

    /// Queue the commands that configure a freshly launched backend.
    fn prepare(&mut self);

    /// Queue installation of `bp`.
    fn add_breakpoint(&mut self, bp: &Breakpoint);

    /// Queue removal of `bp`, or of every breakpoint when `bp` is `None`.
    fn remove_breakpoint(&mut self, bp: Option<&Breakpoint>);

    /// Start the debuggee.
    fn run(&mut self);

    /// Resume a stopped debuggee.
    fn resume(&mut self);

    /// Step into.
    fn step(&mut self);

    /// Step over.
    fn next(&mut self);

    /// Ask the backend to exit.
    fn quit(&mut self);

    /// Queue a backend-specific command verbatim.
    fn send_raw(&mut self, command: &str);

    /// Take every queued protocol line, oldest first.
    fn drain_commands(&mut self) -> Vec<String>;

    /// Number of queued protocol lines not yet drained.
    fn pending_commands(&self) -> usize;
}

// ── Built-in dialects ────────────────────────────────────────────────────────

/// Backend dialects shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// GNU debugger line protocol.
    Gdb,
    /// Windows console debugger.
    Cdb,
}

impl Dialect {
    /// Every built-in dialect.
    pub const ALL: [Self; 2] = [Self::Gdb, Self::Cdb];

    /// Registry token for this dialect.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::Gdb => "gdb",
            Self::Cdb => "cdb",
        }
    }

    /// Dialect named exactly by `token`, if it is a built-in one.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.token() == token)
    }

    /// Dialect used when no token is configured.
    #[must_use]
    pub fn platform_default() -> Self {
        if cfg!(target_env = "msvc") {
            Self::Cdb
        } else {
            Self::Gdb
        }
    }

    /// Factory constructing a fresh driver of this dialect.
    #[must_use]
    pub fn factory(self) -> DriverFactory {
        match self {
            Self::Gdb => Arc::new(|| Box::new(GdbDriver::new()) as Box<dyn DebuggerDriver>),
            Self::Cdb => Arc::new(|| Box::new(CdbDriver::new()) as Box<dyn DebuggerDriver>),
        }
    }
}

impl Display for Dialect {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

// ── Registry ─────────────────────────────────────────────────────────────────

/// Constructor for a driver instance.
pub type DriverFactory = Arc<dyn Fn() -> Box<dyn DebuggerDriver> + Send + Sync>;

/// Maps backend tokens to driver factories.
///
/// An absent or unrecognised token resolves to the default token.
#[derive(Clone)]
pub struct DriverRegistry {
    factories: HashMap<String, DriverFactory>,
    default_token: String,
}

impl DriverRegistry {
    /// An empty registry whose default token is `default_token`.
    #[must_use]
    pub fn new(default_token: impl Into<String>) -> Self {
        Self {
            factories: HashMap::new(),
            default_token: default_token.into(),
        }
    }

    /// Registry holding the built-in dialects.
    ///
    /// Registers `gdb` and `cdb`, plus the `msvctk` toolchain token for CDB.
    /// The default is [`Dialect::platform_default`].
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new(Dialect::platform_default().token());
        for dialect in Dialect::ALL {
            registry.register(dialect.token(), dialect.factory());
        }
        registry.register("msvctk", Dialect::Cdb.factory());
        registry
    }

    /// Built-in registry adjusted by the `default_dialect` and `[aliases]`
    /// settings of `config`.
    #[must_use]
    pub fn from_config(config: &GlobalConfig) -> Self {
        let mut registry = Self::with_builtins();
        if let Some(dialect) = config.default_dialect {
            registry.set_default(dialect.token());
        }
        for (token, dialect) in &config.aliases {
            registry.register(token.clone(), dialect.factory());
        }
        registry
    }

    /// Register (or replace) the factory for `token`.
    pub fn register(&mut self, token: impl Into<String>, factory: DriverFactory) {
        self.factories.insert(token.into(), factory);
    }

    /// Make `token` resolve to whatever `target` resolves to.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Driver` if `target` is not registered.
    pub fn alias(&mut self, token: impl Into<String>, target: &str) -> Result<()> {
        let factory = self
            .factories
            .get(target)
            .cloned()
            .ok_or_else(|| AppError::Driver(format!("cannot alias unknown dialect '{target}'")))?;
        self.factories.insert(token.into(), factory);
        Ok(())
    }

    /// Change the token used for absent or unknown lookups.
    pub fn set_default(&mut self, token: impl Into<String>) {
        self.default_token = token.into();
    }

    /// Token used for absent or unknown lookups.
    #[must_use]
    pub fn default_token(&self) -> &str {
        &self.default_token
    }

    /// Whether `token` has a registered factory.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.factories.contains_key(token)
    }

    /// Resolve `token` to a factory, falling back to the default token.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Driver` if neither `token` nor the default token
    /// has a registered factory.
    pub fn resolve(&self, token: Option<&str>) -> Result<DriverFactory> {
        if let Some(token) = token {
            if let Some(factory) = self.factories.get(token) {
                debug!(token, "driver dialect resolved");
                return Ok(Arc::clone(factory));
            }
            warn!(
                token,
                default = self.default_token.as_str(),
                "unknown backend token, using default dialect"
            );
        }

        self.factories
            .get(&self.default_token)
            .cloned()
            .ok_or_else(|| {
                AppError::Driver(format!(
                    "no driver registered for default dialect '{}'",
                    self.default_token
                ))
            })
    }

    /// Resolve `token` and construct a driver.
    ///
    /// # Errors
    ///
    /// Same as [`DriverRegistry::resolve`].
    pub fn build(&self, token: Option<&str>) -> Result<Box<dyn DebuggerDriver>> {
        self.resolve(token).map(|factory| factory())
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut tokens: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        tokens.sort_unstable();
        f.debug_struct("DriverRegistry")
            .field("tokens", &tokens)
            .field("default_token", &self.default_token)
            .finish()
    }
}

// ── Shared helpers ───────────────────────────────────────────────────────────

/// Join `executable`, `args` and `target` into one shell-quoted command line.
///
/// Parts that cannot be quoted (interior NUL) are passed through untouched.
pub(crate) fn join_command_line(executable: &str, args: &[String], target: &str) -> String {
    std::iter::once(executable)
        .chain(args.iter().map(String::as_str))
        .chain(std::iter::once(target))
        .filter(|part| !part.is_empty())
        .map(|part| shlex::try_quote(part).map_or_else(|_| part.to_owned(), |q| q.into_owned()))
        .collect::<Vec<_>>()
        .join(" ")
}
