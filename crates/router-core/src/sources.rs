//! Static registry of liquidity sources.
//!
//! Every [`Source`] variant is registered here with the sides it can be
//! sampled for and the gas its venue call costs by default. Adding a venue
//! means adding a variant and its entry below.

use alloy_primitives::Address;
use router_types::{FillData, MarketSide, Source};

/// Registry entry of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceInfo {
	/// Sampled as a direct source when selling.
	pub sell: bool,
	/// Sampled as a direct source when buying.
	pub buy: bool,
	/// Gas of one venue call.
	pub gas: u64,
}

const fn info(sell: bool, buy: bool, gas: u64) -> SourceInfo {
	SourceInfo { sell, buy, gas }
}

/// Gas of each additional hop on path-based venues.
const GAS_PER_EXTRA_HOP: u64 = 60_000;

/// Returns the registry entry for `source`.
pub fn source_info(source: Source) -> SourceInfo {
	match source {
		// Native orders and two-hop routes have their own sampling calls.
		Source::Native => info(false, false, 150_000),
		Source::MultiHop => info(false, false, 0),
		Source::Uniswap => info(true, true, 90_000),
		Source::UniswapV2 => info(true, true, 90_000),
		Source::SushiSwap => info(true, true, 90_000),
		Source::Eth2Dai => info(true, true, 400_000),
		Source::Kyber => info(true, true, 500_000),
		Source::Curve => info(true, true, 700_000),
		Source::Balancer => info(true, true, 120_000),
		Source::Bancor => info(true, false, 300_000),
		Source::MStable => info(true, true, 700_000),
		Source::Mooniswap => info(true, true, 130_000),
		Source::Dodo => info(true, true, 100_000),
		Source::Shell => info(true, true, 170_000),
		Source::LiquidityProvider => info(true, true, 140_000),
	}
}

/// Whether `source` can be sampled directly on `side`.
pub fn is_sampled_for(source: Source, side: MarketSide) -> bool {
	let info = source_info(source);
	match side {
		MarketSide::Sell => info.sell,
		MarketSide::Buy => info.buy,
	}
}

/// Default gas of executing a fill with the given payload.
///
/// Path-based venues pay per hop, and a two-hop route pays for both legs.
pub fn default_gas(source: Source, fill_data: &FillData) -> u64 {
	match (source, fill_data) {
		(Source::UniswapV2 | Source::SushiSwap, FillData::TokenPath { token_address_path }) => {
			let extra_hops = token_address_path.len().saturating_sub(2) as u64;
			source_info(source).gas + extra_hops * GAS_PER_EXTRA_HOP
		}
		(
			Source::MultiHop,
			FillData::MultiHop {
				first_hop,
				second_hop,
				..
			},
		) => {
			default_gas(first_hop.source, &first_hop.fill_data)
				+ default_gas(second_hop.source, &second_hop.fill_data)
		}
		_ => source_info(source).gas,
	}
}

/// Whether the source filters let `source` through.
///
/// A non-empty `included` list is an allow-list and takes precedence over
/// `excluded`.
pub fn is_allowed(source: Source, excluded: &[Source], included: &[Source]) -> bool {
	if included.is_empty() {
		!excluded.contains(&source)
	} else {
		included.contains(&source)
	}
}

/// Sources to sample directly on `side`, in registry order.
///
/// The liquidity provider is only available when a registry address is
/// configured.
pub fn sampled_sources(
	side: MarketSide,
	excluded: &[Source],
	included: &[Source],
	liquidity_provider_registry: Option<Address>,
) -> Vec<Source> {
	Source::ALL
		.into_iter()
		.filter(|source| is_sampled_for(*source, side))
		.filter(|source| {
			*source != Source::LiquidityProvider || liquidity_provider_registry.is_some()
		})
		.filter(|source| is_allowed(*source, excluded, included))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use router_types::HopFill;
	use std::sync::Arc;

	#[test]
	fn test_bancor_is_sell_only() {
		let sell = sampled_sources(MarketSide::Sell, &[], &[], None);
		let buy = sampled_sources(MarketSide::Buy, &[], &[], None);
		assert!(sell.contains(&Source::Bancor));
		assert!(!buy.contains(&Source::Bancor));
		assert!(!sell.contains(&Source::Native));
		assert!(!sell.contains(&Source::MultiHop));
	}

	#[test]
	fn test_liquidity_provider_needs_registry() {
		let without = sampled_sources(MarketSide::Sell, &[], &[], None);
		let with = sampled_sources(MarketSide::Sell, &[], &[], Some(Address::repeat_byte(1)));
		assert!(!without.contains(&Source::LiquidityProvider));
		assert!(with.contains(&Source::LiquidityProvider));
	}

	#[test]
	fn test_included_overrides_excluded() {
		let sources = sampled_sources(
			MarketSide::Sell,
			&[Source::Uniswap, Source::Curve],
			&[Source::Curve, Source::Kyber],
			None,
		);
		assert_eq!(sources, vec![Source::Kyber, Source::Curve]);

		let sources = sampled_sources(MarketSide::Sell, &[Source::Uniswap], &[], None);
		assert!(!sources.contains(&Source::Uniswap));
		assert!(sources.contains(&Source::Curve));
	}

	#[test]
	fn test_path_gas_grows_per_hop() {
		let path = |len: usize| FillData::TokenPath {
			token_address_path: vec![Address::ZERO; len],
		};
		assert_eq!(default_gas(Source::UniswapV2, &path(2)), 90_000);
		assert_eq!(default_gas(Source::SushiSwap, &path(3)), 150_000);
	}

	#[test]
	fn test_multi_hop_gas_sums_legs() {
		let leg = |source: Source| HopFill {
			source,
			fill_data: Arc::new(FillData::Empty),
			input: Default::default(),
			output: Default::default(),
		};
		let fill_data = FillData::MultiHop {
			intermediate_token: Address::ZERO,
			first_hop: leg(Source::Uniswap),
			second_hop: leg(Source::Kyber),
		};
		assert_eq!(default_gas(Source::MultiHop, &fill_data), 590_000);
	}
}
