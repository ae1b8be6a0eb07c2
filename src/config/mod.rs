//! Configuration module for gemtool.
//!
//! This module handles all configuration-related functionality:
//! - Parsing and deserializing `gemtool.yaml`
//! - Environment variable overrides
//! - Validation of configuration values

mod parser;
mod spec;
mod validator;

pub use parser::{ConfigParser, DEFAULT_CONFIG_FILES, find_config_file};
pub use spec::ToolConfig;
pub use validator::ConfigValidator;
