//! Command-line front end over the provider registry

pub mod commands;
pub mod render;

pub use commands::{Cli, Commands, run};
