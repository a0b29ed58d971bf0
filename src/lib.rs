//! Skiff - an extensible CLI whose subcommands are external executable plugins
//!
//! The library covers plugin discovery, metadata retrieval, and validation;
//! the `skiff` binary wires it to a clap command tree.

pub mod config;
pub mod error;
pub mod plugins;

pub use config::Config;
pub use error::{Result, SkiffError};
