//! Subcommand implementations that talk to the management API.

pub mod diff;
pub mod merge;
