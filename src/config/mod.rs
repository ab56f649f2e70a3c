//! Configuration module for Site-Mapper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every table is optional; missing values fall back to their defaults.
//!
//! # Example
//!
//! ```no_run
//! use site_mapper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("site-mapper.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, HttpConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
