//! Ordered, indexed breakpoint collection.
//!
//! The registry is the authoritative breakpoint set; whatever the backend
//! holds is reconciled against it. Storage is a plain `Vec` scanned
//! linearly: counts are small, and insertion order decides the order
//! breakpoints are re-applied in.
//!
//! Every mutating operation takes the live driver, if any, and forwards the
//! change to it. `None` means no session is running and nothing is
//! dispatched.

use std::fmt::{Debug, Formatter};

use tracing::debug;

use crate::driver::DebuggerDriver;
use crate::models::breakpoint::Breakpoint;
use crate::observer::SharedObserver;

/// What happens to a breakpoint once it leaves the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveMode {
    /// Drop it.
    Destroy,
    /// Hand it back to the caller.
    Detach,
}

/// Live driver handle passed into registry operations.
pub type LiveDriver<'a> = Option<&'a mut (dyn DebuggerDriver + 'static)>;

/// The breakpoint registry.
pub struct BreakpointRegistry {
    breakpoints: Vec<Breakpoint>,
    /// Last index handed out.
    auto_index: u32,
    observer: SharedObserver,
}

impl BreakpointRegistry {
    /// Create an empty registry reporting lookups to `observer`.
    #[must_use]
    pub fn new(observer: SharedObserver) -> Self {
        Self {
            breakpoints: Vec::new(),
            auto_index: 0,
            observer,
        }
    }

    /// Add a breakpoint at `(filename, line)` and return its index.
    ///
    /// An existing breakpoint at the same location is removed and destroyed
    /// first.
    pub fn add(
        &mut self,
        filename: &str,
        line: u32,
        temporary: bool,
        line_text: &str,
        driver: LiveDriver<'_>,
    ) -> u32 {
        let bp = Breakpoint::new(filename, line, temporary).with_line_text(line_text);
        self.insert(bp, driver)
    }

    /// Register an already-built breakpoint and return its fresh index.
    ///
    /// Replaces any occupant of the same location, assigns the next index,
    /// appends, and forwards to the live driver.
    pub fn insert(&mut self, mut bp: Breakpoint, mut driver: LiveDriver<'_>) -> u32 {
        if let Some(position) = self.find(&bp.filename, bp.line) {
            self.remove_at(position, RemoveMode::Destroy, driver.as_deref_mut());
        }

        self.auto_index += 1;
        bp.index = self.auto_index;

        if let Some(driver) = driver {
            driver.add_breakpoint(&bp);
            bp.already_set = true;
        }

        debug!(index = bp.index, location = %bp.location(), temporary = bp.temporary, "breakpoint added");
        let index = bp.index;
        self.breakpoints.push(bp);
        index
    }

    /// Remove the breakpoint at `(filename, line)`.
    ///
    /// Returns the breakpoint under [`RemoveMode::Detach`], `None` under
    /// [`RemoveMode::Destroy`] or when nothing is there.
    pub fn remove(
        &mut self,
        filename: &str,
        line: u32,
        mode: RemoveMode,
        driver: LiveDriver<'_>,
    ) -> Option<Breakpoint> {
        let position = self.find(filename, line)?;
        self.remove_at(position, mode, driver)
    }

    /// Remove the breakpoint at `position` in registry order.
    ///
    /// Out-of-range positions are a no-op returning `None`.
    pub fn remove_at(
        &mut self,
        position: usize,
        mode: RemoveMode,
        driver: LiveDriver<'_>,
    ) -> Option<Breakpoint> {
        if position >= self.breakpoints.len() {
            return None;
        }
        let bp = self.breakpoints.remove(position);

        if let Some(driver) = driver {
            driver.remove_breakpoint(Some(&bp));
        }

        debug!(index = bp.index, location = %bp.location(), "breakpoint removed");
        match mode {
            RemoveMode::Destroy => None,
            RemoveMode::Detach => Some(bp),
        }
    }

    /// Remove every breakpoint in `filename`, or every breakpoint when
    /// `filename` is `None` or empty.
    ///
    /// Returns the detached breakpoints in registry order (always empty
    /// under [`RemoveMode::Destroy`]).
    pub fn remove_all(
        &mut self,
        filename: Option<&str>,
        mode: RemoveMode,
        mut driver: LiveDriver<'_>,
    ) -> Vec<Breakpoint> {
        let filename = filename.filter(|f| !f.is_empty());
        let mut detached = Vec::new();

        for position in (0..self.breakpoints.len()).rev() {
            if filename.is_some_and(|f| self.breakpoints[position].filename != f) {
                continue;
            }
            if let Some(bp) = self.remove_at(position, mode, driver.as_deref_mut()) {
                detached.push(bp);
            }
        }

        detached.reverse();
        detached
    }

    /// Position of the breakpoint at `(filename, line)`.
    #[must_use]
    pub fn find(&self, filename: &str, line: u32) -> Option<usize> {
        self.observer.lookup_started(filename, line);
        for (position, bp) in self.breakpoints.iter().enumerate() {
            self.observer.lookup_compared(&bp.filename, bp.line);
            if bp.is_at(filename, line) {
                return Some(position);
            }
        }
        self.observer.lookup_missed(filename, line);
        None
    }

    /// Breakpoint at `position` in registry order.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Breakpoint> {
        self.breakpoints.get(position)
    }

    /// Breakpoint carrying stable number `index`.
    #[must_use]
    pub fn by_number(&self, index: u32) -> Option<&Breakpoint> {
        self.breakpoints.iter().find(|bp| bp.index == index)
    }

    /// Remove and re-add the breakpoint at `position`, re-running the full
    /// add path: new index, driver remove + add.
    ///
    /// Returns the new index, or `None` if `position` is out of range.
    pub fn reset(&mut self, position: usize, mut driver: LiveDriver<'_>) -> Option<u32> {
        let bp = self.remove_at(position, RemoveMode::Detach, driver.as_deref_mut())?;
        Some(self.insert(bp, driver))
    }

    /// Renumber contiguously from 1 in current order.
    ///
    /// Called before a driver (re)start so the backend sees clean numbering.
    pub fn renumber(&mut self) {
        self.auto_index = 0;
        for bp in &mut self.breakpoints {
            self.auto_index += 1;
            bp.index = self.auto_index;
        }
        debug!(count = self.auto_index, "breakpoints renumbered");
    }

    /// Reconcile the live driver with the registry before a run.
    ///
    /// Culls temporary breakpoints that were already set in a previous run
    /// (without notifying the driver), clears everything the backend holds,
    /// then re-adds every remaining breakpoint in reverse order. Does
    /// nothing without a live driver.
    pub fn apply_all(&mut self, driver: LiveDriver<'_>) {
        let Some(driver) = driver else {
            return;
        };

        let before = self.breakpoints.len();
        self.breakpoints.retain(|bp| !(bp.temporary && bp.already_set));
        let culled = before - self.breakpoints.len();
        if culled > 0 {
            debug!(culled, "spent temporary breakpoints culled");
        }

        self.observer.breakpoints_applying(self.breakpoints.len());
        driver.remove_breakpoint(None);

        for bp in self.breakpoints.iter_mut().rev() {
            driver.add_breakpoint(bp);
            bp.already_set = true;
        }
    }

    /// Record that the backend confirmed installing breakpoint `index`.
    ///
    /// Returns `false` if no breakpoint carries that number.
    pub fn mark_set(&mut self, index: u32) -> bool {
        match self.breakpoints.iter_mut().find(|bp| bp.index == index) {
            Some(bp) => {
                bp.already_set = true;
                true
            }
            None => false,
        }
    }

    /// Destroy every breakpoint without notifying any driver.
    pub fn clear(&mut self) {
        self.breakpoints.clear();
    }

    /// Number of breakpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    /// Breakpoints in registry order.
    pub fn iter(&self) -> std::slice::Iter<'_, Breakpoint> {
        self.breakpoints.iter()
    }

    /// Last index handed out; the next add receives this plus one.
    #[must_use]
    pub fn last_index(&self) -> u32 {
        self.auto_index
    }
}

impl<'a> IntoIterator for &'a BreakpointRegistry {
    type Item = &'a Breakpoint;
    type IntoIter = std::slice::Iter<'a, Breakpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Debug for BreakpointRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BreakpointRegistry")
            .field("breakpoints", &self.breakpoints)
            .field("auto_index", &self.auto_index)
            .finish_non_exhaustive()
    }
}
