//! Subcommand implementations.

pub mod add;
