//! CDB (Windows console debugger) implementation of [`DebuggerDriver`].
//!
//! Breakpoints are created with `bu<id>` so CDB uses the registry index as
//! its own breakpoint id, and `bc` clears by that same id.

use crate::driver::{join_command_line, CommandQueue, DebuggerDriver};
use crate::models::breakpoint::Breakpoint;

/// CDB dialect driver.
#[derive(Debug, Default)]
pub struct CdbDriver {
    queue: CommandQueue,
}

impl CdbDriver {
    /// Create a driver with an empty command queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DebuggerDriver for CdbDriver {
    fn name(&self) -> &'static str {
        "cdb"
    }

    fn command_line(&self, executable: &str, args: &[String], target: &str) -> String {
        join_command_line(executable, args, target)
    }

    fn prepare(&mut self) {
        // Source-line mode, required for `file:line` breakpoints.
        self.queue.push(".lines");
    }

    fn add_breakpoint(&mut self, bp: &Breakpoint) {
        let one_shot = if bp.temporary { " /1" } else { "" };
        self.queue.push(format!(
            "bu{}{one_shot} `{}:{}`",
            bp.index, bp.filename, bp.line
        ));
    }

    fn remove_breakpoint(&mut self, bp: Option<&Breakpoint>) {
        match bp {
            Some(bp) => self.queue.push(format!("bc {}", bp.index)),
            None => self.queue.push("bc *"),
        }
    }

    fn run(&mut self) {
        self.queue.push("g");
    }

    fn resume(&mut self) {
        self.queue.push("g");
    }

    fn step(&mut self) {
        self.queue.push("t");
    }

    fn next(&mut self) {
        self.queue.push("p");
    }

    fn quit(&mut self) {
        self.queue.push("q");
    }

    fn send_raw(&mut self, command: &str) {
        self.queue.push(command);
    }

    fn drain_commands(&mut self) -> Vec<String> {
        self.queue.drain()
    }

    fn pending_commands(&self) -> usize {
        self.queue.len()
    }
}
