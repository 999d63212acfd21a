//! Native orders and the venue payloads carried alongside fills.
//!
//! The optimizer never looks inside a [`FillData`]; it only carries it from
//! the sampler to the order materializer, which hands it to an encoder.

use alloy_primitives::{Address, Bytes, FixedBytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::math::{mul_div, Rounding};
use crate::{Source, TokenPair};

/// Kind of caller-supplied off-chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NativeOrderKind {
	#[default]
	Limit,
	Rfq,
}

/// A signed off-chain order supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeOrder {
	/// Order hash, used as its identity.
	pub hash: B256,
	#[serde(default)]
	pub kind: NativeOrderKind,
	pub maker: Address,
	pub maker_token: Address,
	pub taker_token: Address,
	/// Total maker amount the order offers.
	pub maker_amount: U256,
	/// Total taker amount the order asks for.
	pub taker_amount: U256,
	pub expiration_time_secs: u64,
	#[serde(default)]
	pub signature: Bytes,
}

impl NativeOrder {
	pub fn pair(&self) -> TokenPair {
		TokenPair::new(self.maker_token, self.taker_token)
	}

	/// Maker amount received for paying `taker_amount`, rounded down.
	pub fn maker_for_taker(&self, taker_amount: U256) -> Option<U256> {
		mul_div(taker_amount, self.maker_amount, self.taker_amount, Rounding::Down)
	}

	/// Taker amount paid for receiving `maker_amount`, rounded up.
	pub fn taker_for_maker(&self, maker_amount: U256) -> Option<U256> {
		mul_div(maker_amount, self.taker_amount, self.maker_amount, Rounding::Up)
	}
}

/// Curve pool metadata needed to call `exchange` on the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurvePoolInfo {
	pub pool_address: Address,
	pub exchange_selector: FixedBytes<4>,
	pub from_token_index: u8,
	pub to_token_index: u8,
}

/// One leg of a two-hop route, as sampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HopFill {
	pub source: Source,
	pub fill_data: Arc<FillData>,
	pub input: U256,
	pub output: U256,
}

/// Opaque per-venue payload needed only at materialization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FillData {
	/// Venues whose bridge needs nothing beyond the token pair.
	Empty,
	Native(NativeOrder),
	/// Router-style venues trading along a token path.
	#[serde(rename_all = "camelCase")]
	TokenPath { token_address_path: Vec<Address> },
	Curve(CurvePoolInfo),
	/// Venues addressed by a single pool contract.
	#[serde(rename_all = "camelCase")]
	Pool { pool_address: Address },
	#[serde(rename_all = "camelCase")]
	Bancor {
		network_address: Address,
		path: Vec<Address>,
	},
	#[serde(rename_all = "camelCase")]
	Dodo {
		pool_address: Address,
		helper_address: Address,
		is_sell_base: bool,
	},
	#[serde(rename_all = "camelCase")]
	MultiHop {
		intermediate_token: Address,
		first_hop: HopFill,
		second_hop: HopFill,
	},
}

/// Shape of a [`FillData`], used to check a payload against its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillDataKind {
	Empty,
	Native,
	TokenPath,
	Curve,
	Pool,
	Bancor,
	Dodo,
	MultiHop,
}

impl FillData {
	pub fn kind(&self) -> FillDataKind {
		match self {
			FillData::Empty => FillDataKind::Empty,
			FillData::Native(_) => FillDataKind::Native,
			FillData::TokenPath { .. } => FillDataKind::TokenPath,
			FillData::Curve(_) => FillDataKind::Curve,
			FillData::Pool { .. } => FillDataKind::Pool,
			FillData::Bancor { .. } => FillDataKind::Bancor,
			FillData::Dodo { .. } => FillDataKind::Dodo,
			FillData::MultiHop { .. } => FillDataKind::MultiHop,
		}
	}

	pub fn native_order(&self) -> Option<&NativeOrder> {
		match self {
			FillData::Native(order) => Some(order),
			_ => None,
		}
	}
}

impl FillDataKind {
	/// The payload shape each source produces.
	pub fn for_source(source: Source) -> FillDataKind {
		match source {
			Source::Native => FillDataKind::Native,
			Source::Uniswap | Source::Eth2Dai | Source::Kyber | Source::MStable => {
				FillDataKind::Empty
			}
			Source::UniswapV2 | Source::SushiSwap => FillDataKind::TokenPath,
			Source::Curve => FillDataKind::Curve,
			Source::Balancer | Source::Mooniswap | Source::Shell | Source::LiquidityProvider => {
				FillDataKind::Pool
			}
			Source::Bancor => FillDataKind::Bancor,
			Source::Dodo => FillDataKind::Dodo,
			Source::MultiHop => FillDataKind::MultiHop,
		}
	}

	pub fn matches(self, fill_data: &FillData) -> bool {
		fill_data.kind() == self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn order(maker_amount: U256, taker_amount: U256) -> NativeOrder {
		NativeOrder {
			hash: B256::repeat_byte(1),
			kind: NativeOrderKind::Limit,
			maker: Address::repeat_byte(2),
			maker_token: Address::repeat_byte(3),
			taker_token: Address::repeat_byte(4),
			maker_amount,
			taker_amount,
			expiration_time_secs: 0,
			signature: Bytes::new(),
		}
	}

	#[test]
	fn test_native_order_conversions_round_once() {
		let o = order(U256::from(200), U256::from(100));
		assert_eq!(o.maker_for_taker(U256::from(7)), Some(U256::from(14)));
		assert_eq!(o.taker_for_maker(U256::from(7)), Some(U256::from(4)));
		assert_eq!(order(U256::from(1), U256::ZERO).maker_for_taker(U256::from(1)), None);
	}

	#[test]
	fn test_native_order_third_rate_is_exact() {
		let unit = U256::from(1_000_000_000_000_000_000u64);
		let o = order(unit, unit * U256::from(3));
		assert_eq!(o.maker_for_taker(unit * U256::from(3)), Some(unit));
		assert_eq!(o.maker_for_taker(unit), Some(U256::from(333_333_333_333_333_333u64)));
		assert_eq!(o.taker_for_maker(U256::from(1)), Some(U256::from(3)));
	}

	#[test]
	fn test_native_order_amounts_parse_from_decimal_strings() {
		let json = serde_json::json!({
			"hash": B256::repeat_byte(1),
			"maker": Address::repeat_byte(2),
			"makerToken": Address::repeat_byte(3),
			"takerToken": Address::repeat_byte(4),
			"makerAmount": "1000000000000000000000000000000",
			"takerAmount": "3",
			"expirationTimeSecs": 0
		});
		let parsed: NativeOrder = serde_json::from_value(json).unwrap();
		assert_eq!(parsed.maker_amount, U256::from(10).pow(U256::from(30)));
		assert_eq!(parsed.kind, NativeOrderKind::Limit);
	}

	#[test]
	fn test_fill_data_shape_per_source() {
		let path = FillData::TokenPath {
			token_address_path: vec![Address::ZERO, Address::repeat_byte(1)],
		};
		assert!(FillDataKind::for_source(Source::UniswapV2).matches(&path));
		assert!(FillDataKind::for_source(Source::SushiSwap).matches(&path));
		assert!(!FillDataKind::for_source(Source::Curve).matches(&path));
		assert!(FillDataKind::for_source(Source::Kyber).matches(&FillData::Empty));
	}

	#[test]
	fn test_fill_data_serde_tagging() {
		let data = FillData::Pool {
			pool_address: Address::repeat_byte(0xab),
		};
		let json = serde_json::to_value(&data).unwrap();
		assert_eq!(json["kind"], "pool");
		let parsed: FillData = serde_json::from_value(json).unwrap();
		assert_eq!(parsed, data);
	}
}
