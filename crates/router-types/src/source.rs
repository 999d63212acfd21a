//! Liquidity source identifiers.
//!
//! Every venue the router can draw liquidity from is a variant of [`Source`].
//! Each variant owns a stable bit in [`SourceFlags`], which is what the
//! optimizer uses for set membership and overhead bookkeeping.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A liquidity venue.
///
/// The declaration order is the registry order: it fixes flag bits, report
/// ordering and the optimizer's tie-break precedence between DEX sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Source {
	Native,
	Uniswap,
	UniswapV2,
	Eth2Dai,
	Kyber,
	Curve,
	Balancer,
	Bancor,
	MStable,
	Mooniswap,
	SushiSwap,
	Dodo,
	Shell,
	LiquidityProvider,
	MultiHop,
}

impl Source {
	/// All sources in registry order.
	pub const ALL: [Source; 15] = [
		Source::Native,
		Source::Uniswap,
		Source::UniswapV2,
		Source::Eth2Dai,
		Source::Kyber,
		Source::Curve,
		Source::Balancer,
		Source::Bancor,
		Source::MStable,
		Source::Mooniswap,
		Source::SushiSwap,
		Source::Dodo,
		Source::Shell,
		Source::LiquidityProvider,
		Source::MultiHop,
	];

	/// Position of this source in the registry.
	pub fn ordinal(self) -> u32 {
		self as u32
	}

	/// The single-bit flag of this source.
	pub fn flag(self) -> SourceFlags {
		SourceFlags(1 << self.ordinal())
	}

	pub fn name(self) -> &'static str {
		match self {
			Source::Native => "Native",
			Source::Uniswap => "Uniswap",
			Source::UniswapV2 => "Uniswap_V2",
			Source::Eth2Dai => "Eth2Dai",
			Source::Kyber => "Kyber",
			Source::Curve => "Curve",
			Source::Balancer => "Balancer",
			Source::Bancor => "Bancor",
			Source::MStable => "mStable",
			Source::Mooniswap => "Mooniswap",
			Source::SushiSwap => "SushiSwap",
			Source::Dodo => "DODO",
			Source::Shell => "Shell",
			Source::LiquidityProvider => "LiquidityProvider",
			Source::MultiHop => "MultiHop",
		}
	}
}

impl fmt::Display for Source {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

#[derive(Debug, Error)]
#[error("Unknown liquidity source: {0}")]
pub struct UnknownSource(pub String);

impl FromStr for Source {
	type Err = UnknownSource;

	/// Accepts both the variant name and the display name, case-insensitively.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Source::ALL
			.into_iter()
			.find(|source| {
				source.name().eq_ignore_ascii_case(s) || format!("{:?}", source).eq_ignore_ascii_case(s)
			})
			.ok_or_else(|| UnknownSource(s.to_string()))
	}
}

/// A set of sources packed into a bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceFlags(pub u32);

impl SourceFlags {
	pub const EMPTY: SourceFlags = SourceFlags(0);

	pub fn bits(self) -> u32 {
		self.0
	}

	pub fn is_empty(self) -> bool {
		self.0 == 0
	}

	pub fn contains(self, source: Source) -> bool {
		self.0 & source.flag().0 != 0
	}

	pub fn insert(&mut self, source: Source) {
		self.0 |= source.flag().0;
	}

	pub fn union(self, other: SourceFlags) -> SourceFlags {
		SourceFlags(self.0 | other.0)
	}

	pub fn intersects(self, other: SourceFlags) -> bool {
		self.0 & other.0 != 0
	}

	/// Members of the set in registry order.
	pub fn iter(self) -> impl Iterator<Item = Source> {
		Source::ALL.into_iter().filter(move |s| self.contains(*s))
	}

	pub fn len(self) -> usize {
		self.0.count_ones() as usize
	}
}

impl FromIterator<Source> for SourceFlags {
	fn from_iter<I: IntoIterator<Item = Source>>(iter: I) -> Self {
		let mut flags = SourceFlags::EMPTY;
		for source in iter {
			flags.insert(source);
		}
		flags
	}
}

impl From<Source> for SourceFlags {
	fn from(source: Source) -> Self {
		source.flag()
	}
}
