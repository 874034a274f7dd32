//! ACC Manager Library
//!
//! Subcommand implementations behind the `acc` binary.

pub mod commands;
pub mod scenario;
