pub mod bundle;
pub mod cli;
pub mod config;
pub mod error;
pub mod fs;
pub mod generator;
pub mod routing;
pub mod template;
pub mod types;

pub use error::{Error, Result};
