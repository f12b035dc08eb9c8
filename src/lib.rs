pub mod cli;
pub mod commands;
pub mod config;
pub mod deps;
pub mod error;
pub mod logging;
pub mod resolver;
pub mod source;
pub mod xdg;

pub use error::{Error, Result};
