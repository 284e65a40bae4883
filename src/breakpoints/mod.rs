//! Breakpoint bookkeeping independent of any backend.

pub mod registry;

pub use registry::{BreakpointRegistry, LiveDriver, RemoveMode};
