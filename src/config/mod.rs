//! Configuration module for pgbackup
//!
//! This module provides configuration management including:
//! - Settings file location (flag, environment, executable directory)
//! - Flat `KEY=VALUE` settings parsing
//! - Dump format codes

pub mod paths;
pub mod settings;

pub use paths::ConfigLocation;
pub use settings::{DumpFormat, Settings};
