//! GDB line-protocol implementation of [`DebuggerDriver`].
//!
//! GDB assigns its own breakpoint numbers in creation order and never reuses
//! them, so they drift from the registry's indices after a reconcile. Single
//! breakpoints are therefore removed by location with `clear`; the registry
//! holds at most one breakpoint per location.

use crate::driver::{join_command_line, CommandQueue, DebuggerDriver};
use crate::models::breakpoint::Breakpoint;

/// GDB dialect driver.
#[derive(Debug, Default)]
pub struct GdbDriver {
    queue: CommandQueue,
}

impl GdbDriver {
    /// Create a driver with an empty command queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// GDB accepts forward slashes on every host; backslashes would need escaping.
fn gdb_path(filename: &str) -> String {
    filename.replace('\\', "/")
}

fn gdb_location(bp: &Breakpoint) -> String {
    format!("\"{}:{}\"", gdb_path(&bp.filename), bp.line)
}

impl DebuggerDriver for GdbDriver {
    fn name(&self) -> &'static str {
        "gdb"
    }

    fn command_line(&self, executable: &str, args: &[String], target: &str) -> String {
        join_command_line(executable, args, target)
    }

    fn prepare(&mut self) {
        self.queue.push("set confirm off");
        self.queue.push("set width 0");
        self.queue.push("set height 0");
        self.queue.push("set breakpoint pending on");
    }

    fn add_breakpoint(&mut self, bp: &Breakpoint) {
        let verb = if bp.temporary { "tbreak" } else { "break" };
        self.queue.push(format!("{verb} {}", gdb_location(bp)));
    }

    fn remove_breakpoint(&mut self, bp: Option<&Breakpoint>) {
        match bp {
            Some(bp) => self.queue.push(format!("clear {}", gdb_location(bp))),
            None => self.queue.push("delete"),
        }
    }

    fn run(&mut self) {
        self.queue.push("run");
    }

    fn resume(&mut self) {
        self.queue.push("continue");
    }

    fn step(&mut self) {
        self.queue.push("step");
    }

    fn next(&mut self) {
        self.queue.push("next");
    }

    fn quit(&mut self) {
        self.queue.push("quit");
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
