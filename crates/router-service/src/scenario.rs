//! Offline planning scenarios.
//!
//! A scenario is a JSON document describing a market operation together with
//! the liquidity each venue offers, as marginal rate curves. It is replayed
//! through a [`CurveSampler`] so plans can be computed without a chain.

use alloy_primitives::{Address, B256, U256};
use anyhow::{bail, Context, Result};
use router_sampler::implementations::curve::{CurveSampler, TwoHopRoute};
use router_types::{FillData, MarketSide, NativeOrder, Source, TokenPair};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// One venue's liquidity.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueCurve {
	pub source: Source,
	pub rates: Vec<Decimal>,
	#[serde(default = "empty_fill_data")]
	pub fill_data: FillData,
}

/// Remaining fillable amount of a native order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fillable {
	pub hash: B256,
	pub taker_amount: U256,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
	pub side: MarketSide,
	/// Taker amount to sell or maker amount to buy, in base units.
	pub amount: U256,
	#[serde(default)]
	pub orders: Vec<NativeOrder>,
	/// Required when `orders` is empty.
	#[serde(default)]
	pub pair: Option<TokenPair>,
	#[serde(default)]
	pub curves: Vec<VenueCurve>,
	#[serde(default)]
	pub fillable: Vec<Fillable>,
	/// Fee token to output token rate; defaults to one.
	#[serde(default)]
	pub reference_rate: Option<Decimal>,
	#[serde(default)]
	pub two_hop: Vec<TwoHopRoute>,
	/// Venues whose sampling calls revert.
	#[serde(default)]
	pub failing: Vec<Source>,
}

fn empty_fill_data() -> FillData {
	FillData::Empty
}

impl Scenario {
	pub async fn load(path: &Path) -> Result<Self> {
		let content = tokio::fs::read_to_string(path)
			.await
			.with_context(|| format!("Failed to read scenario {}", path.display()))?;
		let scenario: Scenario = serde_json::from_str(&content)
			.with_context(|| format!("Failed to parse scenario {}", path.display()))?;
		scenario.validate()?;
		Ok(scenario)
	}

	fn validate(&self) -> Result<()> {
		if self.orders.is_empty() && self.pair.is_none() {
			bail!("A scenario without native orders must name its token pair");
		}
		Ok(())
	}

	/// Token pair of the operation.
	pub fn pair(&self) -> Option<TokenPair> {
		self.pair
			.or_else(|| self.orders.first().map(NativeOrder::pair))
	}

	/// Intermediate tokens of the scenario's two-hop routes.
	pub fn intermediate_tokens(&self) -> Vec<Address> {
		let mut tokens: Vec<Address> = Vec::new();
		for route in &self.two_hop {
			if !tokens.contains(&route.intermediate_token) {
				tokens.push(route.intermediate_token);
			}
		}
		tokens
	}

	/// Builds the sampler replaying this scenario's liquidity.
	pub fn sampler(&self) -> CurveSampler {
		let mut sampler = CurveSampler::new();
		for curve in &self.curves {
			sampler = sampler.with_curve(curve.source, curve.rates.clone(), curve.fill_data.clone());
		}
		for fillable in &self.fillable {
			sampler = sampler.with_fillable(fillable.hash, fillable.taker_amount);
		}
		if let Some(rate) = self.reference_rate {
			sampler = sampler.with_reference_rate(rate);
		}
		for route in &self.two_hop {
			sampler = sampler.with_two_hop(route.clone());
		}
		for source in &self.failing {
			sampler = sampler.with_failing(*source);
		}
		sampler
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	const SCENARIO: &str = r#"{
		"side": "sell",
		"amount": "1000",
		"pair": {
			"maker_token": "0x0101010101010101010101010101010101010101",
			"taker_token": "0x0202020202020202020202020202020202020202"
		},
		"curves": [
			{ "source": "Uniswap", "rates": ["1", "0.5"] },
			{ "source": "Balancer", "rates": ["0.9"], "fillData": { "kind": "pool", "poolAddress": "0x0303030303030303030303030303030303030303" } }
		],
		"failing": ["Kyber"],
		"twoHop": [{
			"intermediate_token": "0x0505050505050505050505050505050505050505",
			"first_source": "Uniswap",
			"first_rate": "2",
			"second_source": "Balancer",
			"second_rate": "0.4"
		}]
	}"#;

	#[tokio::test]
	async fn test_load_scenario() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(SCENARIO.as_bytes()).unwrap();

		let scenario = Scenario::load(file.path()).await.unwrap();
		assert_eq!(scenario.side, MarketSide::Sell);
		assert_eq!(scenario.amount, U256::from(1000));
		assert_eq!(scenario.curves.len(), 2);
		assert_eq!(scenario.curves[0].fill_data, FillData::Empty);
		assert_eq!(scenario.failing, vec![Source::Kyber]);
		assert_eq!(
			scenario.intermediate_tokens(),
			vec![Address::repeat_byte(5)]
		);
		assert_eq!(
			scenario.pair().map(|pair| pair.maker_token),
			Some(Address::repeat_byte(1))
		);
	}

	#[tokio::test]
	async fn test_amounts_keep_every_base_unit() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(
			br#"{
				"side": "sell",
				"amount": "123456789012345678901234567890123",
				"pair": {
					"maker_token": "0x0101010101010101010101010101010101010101",
					"taker_token": "0x0202020202020202020202020202020202020202"
				},
				"fillable": [{
					"hash": "0x0404040404040404040404040404040404040404040404040404040404040404",
					"takerAmount": "100000000000000000000000000001"
				}]
			}"#,
		)
		.unwrap();

		let scenario = Scenario::load(file.path()).await.unwrap();
		assert_eq!(
			scenario.amount,
			U256::from_str_radix("123456789012345678901234567890123", 10).unwrap()
		);
		assert_eq!(
			scenario.fillable[0].taker_amount,
			U256::from(10).pow(U256::from(29)) + U256::from(1)
		);
	}

	#[tokio::test]
	async fn test_scenario_needs_pair_or_orders() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(br#"{ "side": "buy", "amount": "5" }"#).unwrap();

		assert!(Scenario::load(file.path()).await.is_err());
	}
}
