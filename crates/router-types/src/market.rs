//! Market-level types shared by the sampler and the optimizer.

use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::math::{ratio, widen};
use crate::{FillData, Source};

/// Direction of a market operation.
///
/// For a sell the input is the taker asset and the output the maker asset;
/// for a buy the input is the maker asset being bought and the output is the
/// taker asset paid for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketSide {
	Sell,
	Buy,
}

impl MarketSide {
	/// Orders `a` against `b` by adjusted value per unit of input.
	///
	/// `Greater` means `a` has the better rate: more net output for sells,
	/// less total cost for buys. The comparison cross-multiplies, so it is
	/// exact. A valuation without input ranks below any with input.
	pub fn compare_rates(self, a: &Valuation, b: &Valuation) -> Ordering {
		match (a.input.is_zero(), b.input.is_zero()) {
			(true, true) => return Ordering::Equal,
			(true, false) => return Ordering::Less,
			(false, true) => return Ordering::Greater,
			(false, false) => {}
		}

		match self {
			// (a.out - a.cost) / a.in  vs  (b.out - b.cost) / b.in
			MarketSide::Sell => {
				let lhs = (widen(a.output) * widen(b.input))
					.saturating_add(widen(b.cost) * widen(a.input));
				let rhs = (widen(b.output) * widen(a.input))
					.saturating_add(widen(a.cost) * widen(b.input));
				lhs.cmp(&rhs)
			}
			// (a.out + a.cost) / a.in  vs  (b.out + b.cost) / b.in, lower wins
			MarketSide::Buy => {
				let lhs = widen(a.output.saturating_add(a.cost)) * widen(b.input);
				let rhs = widen(b.output.saturating_add(b.cost)) * widen(a.input);
				rhs.cmp(&lhs)
			}
		}
	}

	/// Orders `a` against `b` by total adjusted value, ignoring input.
	///
	/// `Greater` means `a` is better.
	pub fn compare_values(self, a: &Valuation, b: &Valuation) -> Ordering {
		match self {
			MarketSide::Sell => {
				let lhs = widen(a.output) + widen(b.cost);
				let rhs = widen(b.output) + widen(a.cost);
				lhs.cmp(&rhs)
			}
			MarketSide::Buy => {
				let lhs = widen(a.output) + widen(a.cost);
				let rhs = widen(b.output) + widen(b.cost);
				rhs.cmp(&lhs)
			}
		}
	}
}

impl fmt::Display for MarketSide {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			MarketSide::Sell => f.write_str("sell"),
			MarketSide::Buy => f.write_str("buy"),
		}
	}
}

/// Output obtained for some input, together with the fees and overhead it
/// costs in the comparison unit.
///
/// The adjusted value is `output - cost` for sells (possibly negative) and
/// `output + cost` for buys. Keeping both parts unsigned lets every
/// comparison stay in exact integer arithmetic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Valuation {
	pub input: U256,
	pub output: U256,
	pub cost: U256,
}

impl Valuation {
	pub fn new(input: U256, output: U256, cost: U256) -> Self {
		Self {
			input,
			output,
			cost,
		}
	}

	/// Valuation of two disjoint selections taken together.
	pub fn combine(self, other: Valuation) -> Valuation {
		Valuation {
			input: self.input.saturating_add(other.input),
			output: self.output.saturating_add(other.output),
			cost: self.cost.saturating_add(other.cost),
		}
	}

	/// This valuation with `cost` added on top.
	pub fn with_cost(self, cost: U256) -> Valuation {
		Valuation {
			cost: self.cost.saturating_add(cost),
			..self
		}
	}

	/// Adjusted value per unit of input, to `Decimal` precision.
	///
	/// Returns `None` without input or when the rate is beyond `Decimal`'s
	/// range.
	pub fn rate(&self, side: MarketSide) -> Option<Decimal> {
		match side {
			MarketSide::Sell if self.output >= self.cost => {
				ratio(self.output - self.cost, self.input)
			}
			MarketSide::Sell => ratio(self.cost - self.output, self.input).map(|rate| -rate),
			MarketSide::Buy => ratio(self.output.saturating_add(self.cost), self.input),
		}
	}
}

/// The asset pair of a market operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenPair {
	/// Asset received by the taker.
	pub maker_token: Address,
	/// Asset paid by the taker.
	pub taker_token: Address,
}

impl TokenPair {
	pub fn new(maker_token: Address, taker_token: Address) -> Self {
		Self {
			maker_token,
			taker_token,
		}
	}

	/// Token in which fill outputs are denominated on the given side.
	pub fn output_token(&self, side: MarketSide) -> Address {
		match side {
			MarketSide::Sell => self.maker_token,
			MarketSide::Buy => self.taker_token,
		}
	}
}

/// A cumulative point on a venue's price curve.
///
/// `input` and `output` are totals from zero, not increments. The marginal
/// rate between consecutive samples is not assumed to be monotone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DexSample {
	pub source: Source,
	pub input: U256,
	pub output: U256,
	/// Venue payload needed to execute against this sample.
	pub fill_data: Arc<FillData>,
}

impl DexSample {
	pub fn new(source: Source, input: U256, output: U256, fill_data: Arc<FillData>) -> Self {
		Self {
			source,
			input,
			output,
			fill_data,
		}
	}
}
