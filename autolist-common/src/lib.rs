//! # Autolist Common Library
//!
//! Shared code for the autolist services:
//! - Configuration error type
//! - Configuration loading (TOML file, environment overrides, compiled defaults)

pub mod config;
pub mod error;

pub use error::{Error, Result};
