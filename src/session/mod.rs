//! Debugging-session orchestration.

pub mod command;
pub mod controller;

pub use command::UserCommand;
pub use controller::SessionController;
