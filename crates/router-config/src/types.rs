//! Configuration types for the router.

use crate::serde_helpers::{
	deserialize_source_list, deserialize_source_map, serialize_source_map, u256_decimal,
};
use alloy_primitives::{address, Address, U256};
use router_types::Source;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete router configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouterConfig {
	/// Router identity and logging
	pub router: RouterSettings,
	/// Sample point discretization
	#[serde(default)]
	pub sampling: SamplingConfig,
	/// Slippage tolerances
	#[serde(default)]
	pub slippage: SlippageConfig,
	/// Source filters and venue addresses
	#[serde(default)]
	pub sources: SourcesConfig,
	/// Fee and overhead gas settings
	#[serde(default)]
	pub gas: GasConfig,
	/// Well-known token addresses
	#[serde(default)]
	pub tokens: TokensConfig,
}

/// Router identity and logging
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouterSettings {
	pub name: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

/// Sample point discretization
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SamplingConfig {
	/// Number of sample points per venue curve
	pub num_samples: usize,
	/// Exponent base spacing the sample points
	pub sample_distribution_base: Decimal,
	/// Per-request sampling timeout
	pub sample_timeout_ms: Option<u64>,
}

impl Default for SamplingConfig {
	fn default() -> Self {
		Self {
			num_samples: 13,
			sample_distribution_base: Decimal::new(105, 2),
			sample_timeout_ms: None,
		}
	}
}

/// Slippage tolerances, as fractions
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlippageConfig {
	/// Applied to every non-native order
	pub bridge_slippage: Decimal,
	/// Fallback value loss below which the fallback is omitted
	pub max_fallback_slippage: Decimal,
}

impl Default for SlippageConfig {
	fn default() -> Self {
		Self {
			bridge_slippage: Decimal::new(5, 3),
			max_fallback_slippage: Decimal::new(5, 2),
		}
	}
}

/// Source filters and venue addresses
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
	/// Sources never queried
	#[serde(default, deserialize_with = "deserialize_source_list")]
	pub excluded: Vec<Source>,
	/// When non-empty, the only sources queried
	#[serde(default, deserialize_with = "deserialize_source_list")]
	pub included: Vec<Source>,
	/// Build a fallback path from disjoint sources
	#[serde(default = "default_true")]
	pub allow_fallback: bool,
	/// Tokens tried as the middle leg of two-hop routes
	#[serde(default)]
	pub intermediate_tokens: Vec<Address>,
	/// Enables the ad-hoc liquidity provider source
	#[serde(default)]
	pub liquidity_provider_registry: Option<Address>,
	/// Bridge contract per venue
	#[serde(
		default,
		deserialize_with = "deserialize_source_map",
		serialize_with = "serialize_source_map"
	)]
	pub bridges: BTreeMap<Source, Address>,
}

impl Default for SourcesConfig {
	fn default() -> Self {
		Self {
			excluded: Vec::new(),
			included: Vec::new(),
			allow_fallback: true,
			intermediate_tokens: Vec::new(),
			liquidity_provider_registry: None,
			bridges: BTreeMap::new(),
		}
	}
}

/// Fee and overhead gas settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GasConfig {
	/// Gas price in wei, as a decimal string
	#[serde(with = "u256_decimal")]
	pub gas_price: U256,
	/// Gas per venue call, overriding the built-in schedule
	#[serde(
		default,
		deserialize_with = "deserialize_source_map",
		serialize_with = "serialize_source_map"
	)]
	pub fee_schedule: BTreeMap<Source, u64>,
	/// Fixed gas charged once per source used in a plan
	#[serde(
		default,
		deserialize_with = "deserialize_source_map",
		serialize_with = "serialize_source_map"
	)]
	pub overhead: BTreeMap<Source, u64>,
	/// Overhead gas for sources absent from `overhead`
	#[serde(default)]
	pub default_overhead: u64,
}

impl Default for GasConfig {
	fn default() -> Self {
		Self {
			gas_price: U256::from(50_000_000_000u64),
			fee_schedule: BTreeMap::new(),
			overhead: BTreeMap::new(),
			default_overhead: 0,
		}
	}
}

/// Well-known token addresses
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokensConfig {
	/// Token fees are denominated in
	pub weth: Address,
}

impl Default for TokensConfig {
	fn default() -> Self {
		Self {
			weth: address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"),
		}
	}
}

impl Default for RouterConfig {
	fn default() -> Self {
		Self {
			router: RouterSettings {
				name: "market-router".to_string(),
				log_level: default_log_level(),
			},
			sampling: SamplingConfig::default(),
			slippage: SlippageConfig::default(),
			sources: SourcesConfig::default(),
			gas: GasConfig::default(),
			tokens: TokensConfig::default(),
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_true() -> bool {
	true
}
