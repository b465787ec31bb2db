//! Subcommand implementations.

pub mod dump;
pub mod info;
pub mod log;
pub mod merge;
pub mod put;
pub mod sync;
