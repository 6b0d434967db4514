//! CLI subcommand implementations.

pub mod analyze;
pub mod inspect;
pub mod util;
