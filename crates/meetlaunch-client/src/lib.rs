//! CLI, configuration, launch action
//!
//! This crate provides the `meetlaunch` command-line interface.

pub mod actions;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
