//! Domain model module declarations.

pub mod breakpoint;
