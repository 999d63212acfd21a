// router-config/src/lib.rs

use alloy_primitives::U256;
use regex::Regex;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

mod serde_helpers;
mod types;

pub use types::*;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Configuration loader with environment variable substitution
#[derive(Default)]
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "ROUTER_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<RouterConfig, ConfigError> {
		let mut config = if let Some(file_path) = &self.file_path {
			self.load_from_file(file_path).await?
		} else {
			return Err(ConfigError::FileNotFound(
				"No configuration file specified".to_string(),
			));
		};

		self.apply_env_overrides(&mut config)?;

		validate_config(&config)?;

		Ok(config)
	}

	async fn load_from_file(&self, file_path: &str) -> Result<RouterConfig, ConfigError> {
		let content = tokio::fs::read_to_string(file_path)
			.await
			.map_err(|e| match e.kind() {
				std::io::ErrorKind::NotFound => ConfigError::FileNotFound(file_path.to_string()),
				_ => ConfigError::IoError(e),
			})?;

		let substituted_content = self.substitute_env_vars(&content)?;

		let config = if file_path.ends_with(".json") {
			from_json(&substituted_content)?
		} else {
			from_toml(&substituted_content)?
		};
		debug!(path = %file_path, name = %config.router.name, "Loaded router configuration");

		Ok(config)
	}

	fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
		let mut result = content.to_string();

		// Find and replace ${VAR_NAME} patterns
		let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::ParseError(e.to_string()))?;

		for cap in re.captures_iter(content) {
			let full_match = &cap[0];
			let var_name = &cap[1];

			let env_value = env::var(var_name)
				.map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

			result = result.replace(full_match, &env_value);
		}

		Ok(result)
	}

	fn apply_env_overrides(&self, config: &mut RouterConfig) -> Result<(), ConfigError> {
		if let Ok(log_level) = env::var(format!("{}LOG_LEVEL", self.env_prefix)) {
			config.router.log_level = log_level;
		}

		if let Ok(gas_price) = env::var(format!("{}GAS_PRICE", self.env_prefix)) {
			config.gas.gas_price = U256::from_str_radix(&gas_price, 10)
				.map_err(|e| ConfigError::ValidationError(format!("Invalid gas price: {}", e)))?;
		}

		if let Ok(slippage) = env::var(format!("{}BRIDGE_SLIPPAGE", self.env_prefix)) {
			config.slippage.bridge_slippage = slippage.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid bridge slippage: {}", e))
			})?;
		}

		Ok(())
	}
}

/// Parses a TOML configuration document.
pub fn from_toml(content: &str) -> Result<RouterConfig, ConfigError> {
	toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Parses a JSON configuration document.
pub fn from_json(content: &str) -> Result<RouterConfig, ConfigError> {
	serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Checks the cross-field constraints serde cannot express.
pub fn validate_config(config: &RouterConfig) -> Result<(), ConfigError> {
	if config.sampling.num_samples == 0 {
		return Err(ConfigError::ValidationError(
			"num_samples must be at least 1".to_string(),
		));
	}

	if config.sampling.sample_distribution_base <= rust_decimal::Decimal::ZERO {
		return Err(ConfigError::ValidationError(
			"sample_distribution_base must be positive".to_string(),
		));
	}

	for (name, value) in [
		("bridge_slippage", config.slippage.bridge_slippage),
		("max_fallback_slippage", config.slippage.max_fallback_slippage),
	] {
		if value.is_sign_negative() || value > rust_decimal::Decimal::ONE {
			return Err(ConfigError::ValidationError(format!(
				"{} must be within [0, 1], got {}",
				name, value
			)));
		}
	}

	if let Some(source) = config
		.sources
		.included
		.iter()
		.find(|source| config.sources.excluded.contains(source))
	{
		return Err(ConfigError::ValidationError(format!(
			"Source {} is both included and excluded",
			source
		)));
	}

	Ok(())
}
