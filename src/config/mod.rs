//! Configuration module for Jira-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use jira_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Scraping {} projects", config.jira.projects.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, JiraConfig, LimitsConfig, OutputConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
