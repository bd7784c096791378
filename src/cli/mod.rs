//! CLI module
//!
//! Command-line interface for poking an API outside the feature suite.
//!
//! # Commands
//!
//! - `request` - Send one request and print the response
//! - `check` - GET an endpoint and match its body against a fixture

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat, TargetArgs};
pub use runner::Runner;
