//! The uniform liquidity unit the optimizer reasons about.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::math::{mul_div, Rounding};
use crate::{FillData, MarketSide, Source, SourceFlags, Valuation};

/// A discrete increment of liquidity from one source.
///
/// Fills of one sequence must be taken in `index` order. `penalty` is the
/// fee of the venue call in the comparison unit; it lowers a sell's value
/// and raises a buy's cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
	pub source: Source,
	pub fill_data: Arc<FillData>,
	/// Identifies the sequence (one venue curve or one native order).
	pub sequence_id: usize,
	/// Position inside the sequence.
	pub index: usize,
	pub input: U256,
	pub output: U256,
	pub penalty: U256,
}

impl Fill {
	pub fn flag(&self) -> SourceFlags {
		self.source.flag()
	}

	pub fn valuation(&self) -> Valuation {
		Valuation::new(self.input, self.output, self.penalty)
	}

	/// Returns this fill reduced to `input`, scaling output proportionally.
	///
	/// The fee penalty is kept whole: a partially consumed increment still
	/// pays for its venue call. Output is floored on sells and ceiled on
	/// buys so a clipped fill never promises more than it sampled.
	pub fn clip(&self, side: MarketSide, input: U256) -> Fill {
		if input >= self.input {
			return self.clone();
		}
		let rounding = match side {
			MarketSide::Sell => Rounding::Down,
			MarketSide::Buy => Rounding::Up,
		};
		let output = mul_div(self.output, input, self.input, rounding).unwrap_or(self.output);
		Fill {
			input,
			output,
			..self.clone()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn fill(input: u64, output: u64, penalty: u64) -> Fill {
		Fill {
			source: Source::Uniswap,
			fill_data: Arc::new(FillData::Empty),
			sequence_id: 0,
			index: 0,
			input: U256::from(input),
			output: U256::from(output),
			penalty: U256::from(penalty),
		}
	}

	#[test]
	fn test_clip_keeps_whole_penalty() {
		let clipped = fill(100, 99, 9).clip(MarketSide::Sell, U256::from(50));
		assert_eq!(clipped.input, U256::from(50));
		assert_eq!(clipped.output, U256::from(49));
		assert_eq!(clipped.penalty, U256::from(9));
	}

	#[test]
	fn test_clip_rounds_buy_cost_up() {
		let clipped = fill(3, 100, 10).clip(MarketSide::Buy, U256::from(1));
		assert_eq!(clipped.output, U256::from(34));
		assert_eq!(clipped.penalty, U256::from(10));
	}

	#[test]
	fn test_clip_at_one_third_is_exact() {
		let three = U256::from(3_000_000_000_000_000_000u64);
		let one = U256::from(1_000_000_000_000_000_000u64);
		let original = Fill {
			input: three,
			output: three,
			..fill(0, 0, 0)
		};
		assert_eq!(original.clip(MarketSide::Sell, one).output, one);
		assert_eq!(original.clip(MarketSide::Buy, one).output, one);
	}

	#[test]
	fn test_clip_beyond_size_is_identity() {
		let original = fill(10, 10, 0);
		assert_eq!(original.clip(MarketSide::Sell, U256::from(25)), original);
	}
}
