//! Debugging-session lifecycle: driver start/stop and breakpoint routing.
//!
//! [`SessionController`] owns the breakpoint registry and at most one live
//! driver. Every registry change is forwarded to the live driver; with no
//! driver the registry still changes and nothing is dispatched.
//!
//! Starting always stops the previous driver first, so two drivers never
//! share a backend channel.

use tracing::{debug, info, info_span};

use crate::breakpoints::{BreakpointRegistry, RemoveMode};
use crate::channel::ProcessChannel;
use crate::driver::{DebuggerDriver, DriverRegistry};
use crate::models::breakpoint::Breakpoint;
use crate::observer::SharedObserver;
use crate::Result;

/// Owner of the breakpoint registry and the live driver.
pub struct SessionController {
    drivers: DriverRegistry,
    registry: BreakpointRegistry,
    driver: Option<Box<dyn DebuggerDriver>>,
}

impl SessionController {
    /// Create a controller with no live driver and an empty registry.
    #[must_use]
    pub fn new(drivers: DriverRegistry, observer: SharedObserver) -> Self {
        Self {
            drivers,
            registry: BreakpointRegistry::new(observer),
            driver: None,
        }
    }

    // ── Driver lifecycle ─────────────────────────────────────────────────────

    /// Start a driver for `backend`.
    ///
    /// Stops any live driver, renumbers the registry 1..N, then builds the
    /// driver registered for `backend`. An absent or unknown token falls
    /// back to the registry's default dialect.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Driver` if no factory exists for `backend` or for
    /// the default dialect. The previous driver is stopped either way.
    pub fn start(&mut self, backend: Option<&str>) -> Result<()> {
        let span = info_span!("start_driver", backend = backend.unwrap_or("<default>"));
        let _guard = span.enter();

        self.stop();
        self.registry.renumber();

        let driver = self.drivers.build(backend)?;
        info!(dialect = driver.name(), "driver started");
        self.driver = Some(driver);
        Ok(())
    }

    /// Destroy the live driver, if any. Idempotent.
    pub fn stop(&mut self) {
        if let Some(driver) = self.driver.take() {
            info!(dialect = driver.name(), "driver stopped");
        }
    }

    /// Full teardown at the end of a debugging lifecycle.
    ///
    /// Tells a live driver to remove every breakpoint, stops it, then
    /// destroys every breakpoint in the registry.
    pub fn clean_up(&mut self) {
        if let Some(driver) = self.driver.as_deref_mut() {
            driver.remove_breakpoint(None);
        }
        self.stop();
        self.registry.clear();
        debug!("session cleaned up");
    }

    /// The live driver, for backend-specific commands.
    #[must_use]
    pub fn driver(&self) -> Option<&dyn DebuggerDriver> {
        self.driver.as_deref()
    }

    /// The live driver, for backend-specific commands.
    pub fn driver_mut(&mut self) -> Option<&mut (dyn DebuggerDriver + 'static)> {
        self.driver.as_deref_mut()
    }

    /// Whether a driver is live.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.driver.is_some()
    }

    /// Write every command the live driver has queued to `channel`.
    ///
    /// Returns the number of lines sent (zero without a driver).
    pub fn flush_to(&mut self, channel: &mut ProcessChannel) -> usize {
        let Some(driver) = self.driver.as_deref_mut() else {
            return 0;
        };
        let commands = driver.drain_commands();
        for command in &commands {
            channel.send_line(command);
        }
        commands.len()
    }

    // ── Breakpoints ──────────────────────────────────────────────────────────

    /// Add a breakpoint, replacing any at the same location. Returns its index.
    pub fn add_breakpoint(
        &mut self,
        filename: &str,
        line: u32,
        temporary: bool,
        line_text: &str,
    ) -> u32 {
        self.registry.add(
            filename,
            line,
            temporary,
            line_text,
            self.driver.as_deref_mut(),
        )
    }

    /// Remove the breakpoint at `(filename, line)`.
    pub fn remove_breakpoint(
        &mut self,
        filename: &str,
        line: u32,
        mode: RemoveMode,
    ) -> Option<Breakpoint> {
        self.registry
            .remove(filename, line, mode, self.driver.as_deref_mut())
    }

    /// Remove the breakpoint at `position`.
    pub fn remove_breakpoint_at(&mut self, position: usize, mode: RemoveMode) -> Option<Breakpoint> {
        self.registry
            .remove_at(position, mode, self.driver.as_deref_mut())
    }

    /// Remove every breakpoint, or every breakpoint in `filename`.
    pub fn remove_all_breakpoints(
        &mut self,
        filename: Option<&str>,
        mode: RemoveMode,
    ) -> Vec<Breakpoint> {
        self.registry
            .remove_all(filename, mode, self.driver.as_deref_mut())
    }

    /// Position of the breakpoint at `(filename, line)`.
    #[must_use]
    pub fn find_breakpoint(&self, filename: &str, line: u32) -> Option<usize> {
        self.registry.find(filename, line)
    }

    /// Breakpoint at `position`.
    #[must_use]
    pub fn breakpoint(&self, position: usize) -> Option<&Breakpoint> {
        self.registry.get(position)
    }

    /// Breakpoint carrying stable number `index`.
    #[must_use]
    pub fn breakpoint_by_number(&self, index: u32) -> Option<&Breakpoint> {
        self.registry.by_number(index)
    }

    /// Force re-synchronization of the breakpoint at `position`.
    pub fn reset_breakpoint(&mut self, position: usize) -> Option<u32> {
        self.registry.reset(position, self.driver.as_deref_mut())
    }

    /// Renumber breakpoints contiguously from 1.
    pub fn renumber_breakpoints(&mut self) {
        self.registry.renumber();
    }

    /// Reconcile the live driver with the registry before a run.
    pub fn apply_breakpoints(&mut self) {
        self.registry.apply_all(self.driver.as_deref_mut());
    }

    /// Record a backend-confirmed install of breakpoint `index`.
    pub fn mark_breakpoint_set(&mut self, index: u32) -> bool {
        self.registry.mark_set(index)
    }

    /// Breakpoints in registry order.
    pub fn breakpoints(&self) -> std::slice::Iter<'_, Breakpoint> {
        self.registry.iter()
    }

    /// The underlying registry.
    #[must_use]
    pub fn registry(&self) -> &BreakpointRegistry {
        &self.registry
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("drivers", &self.drivers)
            .field("registry", &self.registry)
            .field("driver", &self.driver.as_deref().map(DebuggerDriver::name))
            .finish()
    }
}
