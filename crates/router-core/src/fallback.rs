//! Secondary path over sources disjoint from the primary.

use crate::fills::FillSequence;
use crate::path_optimizer::{Path, PathOptimizer};
use router_types::MarketSide;
use rust_decimal::Decimal;
use tracing::debug;

/// Builds fallback paths.
pub struct FallbackGenerator<'a> {
	optimizer: &'a PathOptimizer<'a>,
	max_fallback_slippage: Decimal,
}

impl<'a> FallbackGenerator<'a> {
	pub fn new(optimizer: &'a PathOptimizer<'a>, max_fallback_slippage: Decimal) -> Self {
		Self {
			optimizer,
			max_fallback_slippage,
		}
	}

	/// Returns a path avoiding every source of `primary`, or `None` when no
	/// fallback is wanted or it would not materially change the outcome.
	pub fn generate(
		&self,
		primary: &Path,
		sequences: &[FillSequence],
		allow_fallback: bool,
	) -> Option<Path> {
		if !allow_fallback || primary.is_empty() {
			return None;
		}

		let disjoint: Vec<&FillSequence> = sequences
			.iter()
			.filter(|sequence| !primary.flags.contains(sequence.source))
			.collect();
		let fallback = self.optimizer.optimize(&disjoint);
		if fallback.is_empty() {
			debug!("No disjoint liquidity for a fallback path");
			return None;
		}

		match self.estimate_loss(primary, &fallback) {
			Some(loss) if loss <= self.max_fallback_slippage => {
				debug!(%loss, "Fallback within tolerated slippage, omitting it");
				None
			}
			loss => {
				debug!(
					loss = ?loss,
					sources = ?fallback.sources(),
					"Generated fallback path"
				);
				Some(fallback)
			}
		}
	}

	/// Relative value lost by settling on the fallback instead of the
	/// primary. `None` means the loss is material regardless of tolerance.
	fn estimate_loss(&self, primary: &Path, fallback: &Path) -> Option<Decimal> {
		if fallback.input < primary.input {
			return None;
		}
		let primary_rate = primary.adjusted_rate()?;
		let fallback_rate = fallback.adjusted_rate()?;
		if primary_rate <= Decimal::ZERO {
			return None;
		}
		let loss = match primary.side {
			MarketSide::Sell => primary_rate - fallback_rate,
			MarketSide::Buy => fallback_rate - primary_rate,
		};
		loss.checked_div(primary_rate)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fees::NoOverhead;
	use alloy_primitives::U256;
	use router_types::{Fill, FillData, Source};
	use rust_decimal_macros::dec;
	use std::sync::Arc;

	fn sequence(id: usize, source: Source, input: u64, output: u64) -> FillSequence {
		FillSequence {
			id,
			source,
			fills: vec![Fill {
				source,
				fill_data: Arc::new(FillData::Empty),
				sequence_id: id,
				index: 0,
				input: U256::from(input),
				output: U256::from(output),
				penalty: U256::ZERO,
			}],
		}
	}

	fn sequences() -> Vec<FillSequence> {
		vec![
			sequence(0, Source::Uniswap, 100, 100),
			sequence(1, Source::Curve, 100, 90),
		]
	}

	fn optimizer(side: MarketSide) -> PathOptimizer<'static> {
		PathOptimizer::new(side, U256::from(100), &NoOverhead, Decimal::ONE)
	}

	#[test]
	fn test_fallback_is_disjoint_from_primary() {
		let sequences = sequences();
		let optimizer = optimizer(MarketSide::Sell);
		let primary = optimizer.optimize(&sequences.iter().collect::<Vec<_>>());
		let generator = FallbackGenerator::new(&optimizer, dec!(0.05));

		let fallback = generator.generate(&primary, &sequences, true).unwrap();
		assert_eq!(primary.sources(), vec![Source::Uniswap]);
		assert_eq!(fallback.sources(), vec![Source::Curve]);
		assert!(!primary.flags.intersects(fallback.flags));
	}

	#[test]
	fn test_fallback_within_tolerance_is_omitted() {
		let sequences = sequences();
		let optimizer = optimizer(MarketSide::Sell);
		let primary = optimizer.optimize(&sequences.iter().collect::<Vec<_>>());

		// The fallback loses exactly 10%.
		let generator = FallbackGenerator::new(&optimizer, dec!(0.1));
		assert!(generator.generate(&primary, &sequences, true).is_none());
	}

	#[test]
	fn test_buy_fallback_loss_is_extra_cost() {
		let sequences = vec![
			sequence(0, Source::Uniswap, 100, 100),
			sequence(1, Source::Curve, 100, 104),
		];
		let optimizer = optimizer(MarketSide::Buy);
		let primary = optimizer.optimize(&sequences.iter().collect::<Vec<_>>());
		assert_eq!(primary.sources(), vec![Source::Uniswap]);

		// Paying 4% more is material under a 3% tolerance only.
		let strict = FallbackGenerator::new(&optimizer, dec!(0.03));
		assert!(strict.generate(&primary, &sequences, true).is_some());
		let lenient = FallbackGenerator::new(&optimizer, dec!(0.04));
		assert!(lenient.generate(&primary, &sequences, true).is_none());
	}

	#[test]
	fn test_fallback_disabled_or_without_liquidity() {
		let sequences = sequences();
		let optimizer = optimizer(MarketSide::Sell);
		let primary = optimizer.optimize(&sequences.iter().collect::<Vec<_>>());
		let generator = FallbackGenerator::new(&optimizer, Decimal::ZERO);

		assert!(generator.generate(&primary, &sequences, false).is_none());
		assert!(generator.generate(&primary, &sequences[..1], true).is_none());
		assert!(generator
			.generate(&Path::empty(MarketSide::Sell, U256::from(100)), &sequences, true)
			.is_none());
	}

	#[test]
	fn test_partial_fallback_is_always_material() {
		let sequences = vec![
			sequence(0, Source::Uniswap, 100, 100),
			sequence(1, Source::Curve, 50, 49),
		];
		let optimizer = optimizer(MarketSide::Sell);
		let primary = optimizer.optimize(&sequences.iter().collect::<Vec<_>>());
		let generator = FallbackGenerator::new(&optimizer, dec!(0.5));

		assert_eq!(primary.sources(), vec![Source::Uniswap]);
		let fallback = generator.generate(&primary, &sequences, true).unwrap();
		assert_eq!(fallback.input, U256::from(50));
	}
}
