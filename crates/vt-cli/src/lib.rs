//! Visit timeline CLI library.
//!
//! This crate provides the CLI interface for the visit timeline engine.

mod cli;
pub mod commands;
mod config;
pub mod source;

pub use cli::{Cli, Commands};
pub use config::{Config, parse_utc_offset};
