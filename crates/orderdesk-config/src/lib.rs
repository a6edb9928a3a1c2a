//! Configuration module for the order desk.
//!
//! This module provides structures and utilities for managing service
//! configuration. It supports loading configuration from TOML files and
//! validates that every referenced backend and catalog entry is usable.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files for better organization:
//! - Use `include = ["storage.toml", "catalog.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)
//!
//! Values of the form `${VAR}` or `${VAR:-default}` are substituted from the
//! environment before parsing.

mod loader;

use once_cell::sync::Lazy;
use orderdesk_types::Product;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the order desk.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this service instance.
	pub service: ServiceConfig,
	/// Configuration for the storage backend.
	pub storage: StorageConfig,
	/// Order intake and listing rules.
	#[serde(default)]
	pub orders: OrdersConfig,
	/// Products seeded into the catalog at startup.
	#[serde(default)]
	pub catalog: CatalogConfig,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Identity of this service instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Identifier used in logs.
	pub id: String,
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Order intake and listing rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrdersConfig {
	/// Largest quantity accepted from public order submissions.
	#[serde(default = "default_public_max_quantity")]
	pub public_max_quantity: u32,
	/// Prefix of generated order codes.
	#[serde(default = "default_code_prefix")]
	pub code_prefix: String,
	/// How many candidate codes are tried before giving up.
	#[serde(default = "default_code_max_attempts")]
	pub code_max_attempts: u32,
	/// Limit applied to listings that do not request one.
	#[serde(default = "default_list_limit")]
	pub default_list_limit: usize,
}

impl Default for OrdersConfig {
	fn default() -> Self {
		Self {
			public_max_quantity: default_public_max_quantity(),
			code_prefix: default_code_prefix(),
			code_max_attempts: default_code_max_attempts(),
			default_list_limit: default_list_limit(),
		}
	}
}

fn default_public_max_quantity() -> u32 {
	100
}

fn default_code_prefix() -> String {
	"ORD".to_string()
}

fn default_code_max_attempts() -> u32 {
	20
}

fn default_list_limit() -> usize {
	orderdesk_types::MAX_LIST_LIMIT
}

/// Products seeded into the catalog.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogConfig {
	#[serde(default)]
	pub products: Vec<Product>,
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Request timeout in seconds.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
	/// Maximum request size in bytes.
	#[serde(default = "default_max_request_size")]
	pub max_request_size: usize,
	/// CORS configuration; permissive when absent.
	pub cors: Option<CorsConfig>,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
	/// Allowed origins for CORS.
	pub allowed_origins: Vec<String>,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

fn default_api_timeout() -> u64 {
	30
}

fn default_max_request_size() -> usize {
	1024 * 1024
}

static ENV_VAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.unwrap_or_else(|e| panic!("invalid env var pattern: {e}"))
});

/// Resolves environment variables in a string.
///
/// Replaces `${VAR_NAME}` with the value of `VAR_NAME` and
/// `${VAR_NAME:-default}` with the value or the default. Inputs larger than
/// 1MB are rejected.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let mut result = String::with_capacity(input.len());
	let mut last = 0;
	for cap in ENV_VAR_PATTERN.captures_iter(input) {
		let (Some(full), Some(name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match (std::env::var(name.as_str()), cap.get(2)) {
			(Ok(v), _) => v,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					name.as_str()
				)))
			},
		};
		result.push_str(&input[last..full.start()]);
		result.push_str(&value);
		last = full.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates cross-field constraints that serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.trim().is_empty() {
			return Err(ConfigError::Validation("Service ID cannot be empty".into()));
		}

		if self.storage.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one storage implementation must be configured".into(),
			));
		}
		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Storage primary implementation cannot be empty".into(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' is not configured in [storage.implementations]",
				self.storage.primary
			)));
		}

		if self.orders.public_max_quantity == 0 {
			return Err(ConfigError::Validation(
				"orders.public_max_quantity must be at least 1".into(),
			));
		}
		if self.orders.code_max_attempts == 0 {
			return Err(ConfigError::Validation(
				"orders.code_max_attempts must be at least 1".into(),
			));
		}
		if self.orders.code_prefix.is_empty()
			|| !self
				.orders
				.code_prefix
				.chars()
				.all(|c| c.is_ascii_alphanumeric())
		{
			return Err(ConfigError::Validation(
				"orders.code_prefix must be non-empty and alphanumeric".into(),
			));
		}

		let mut refs = HashSet::new();
		for product in &self.catalog.products {
			if product.product_ref.trim().is_empty() {
				return Err(ConfigError::Validation(
					"Catalog product reference cannot be empty".into(),
				));
			}
			if !refs.insert(product.product_ref.as_str()) {
				return Err(ConfigError::Validation(format!(
					"Duplicate catalog product reference '{}'",
					product.product_ref
				)));
			}
			if product.unit_price.is_sign_negative() {
				return Err(ConfigError::Validation(format!(
					"Product '{}' has a negative unit price",
					product.product_ref
				)));
			}
		}

		Ok(())
	}
}

/// Parses configuration from a TOML string.
///
/// Environment variables are resolved and the configuration is validated
/// after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
