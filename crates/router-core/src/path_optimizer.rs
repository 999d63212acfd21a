//! Search for the best combination of fills.
//!
//! The optimizer grows a path greedily. At each step it looks at every
//! sequence from its cursor and considers every prefix of the remaining
//! fills, so a curve whose later increments beat its first one is still
//! valued correctly. The candidate with the best fee- and overhead-adjusted
//! average rate is appended. Overhead of a source not yet in the path is
//! charged to its first extension.
//!
//! The mixed greedy run is compared against each source on its own, which
//! guards against an early cheap increment locking the path into a source
//! whose overhead makes it worse overall.
//!
//! Ties are broken by precedence: the earlier sequence wins, and inside a
//! sequence the shorter extension wins.

use crate::fees::OverheadEstimator;
use crate::fills::FillSequence;
use alloy_primitives::U256;
use router_types::math::{mul_decimal, saturating_sum, Rounding};
use router_types::{Fill, MarketSide, Source, SourceFlags, Valuation};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::debug;

/// An ordered selection of fills covering (part of) a target input.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
	pub side: MarketSide,
	pub target: U256,
	/// Fills grouped by sequence in order of first use.
	pub fills: Vec<Fill>,
	pub flags: SourceFlags,
	pub input: U256,
	pub output: U256,
	/// Sum of the fills' fee penalties.
	pub penalty: U256,
	/// Fixed overhead of every source in `flags`, in the comparison unit.
	pub overhead: U256,
}

impl Path {
	pub fn empty(side: MarketSide, target: U256) -> Self {
		Self {
			side,
			target,
			fills: Vec::new(),
			flags: SourceFlags::EMPTY,
			input: U256::ZERO,
			output: U256::ZERO,
			penalty: U256::ZERO,
			overhead: U256::ZERO,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.fills.is_empty()
	}

	/// Whether the path covers the whole target.
	pub fn is_complete(&self) -> bool {
		self.input >= self.target
	}

	/// Output together with every fee and overhead the path pays.
	pub fn valuation(&self) -> Valuation {
		Valuation::new(self.input, self.output, self.penalty.saturating_add(self.overhead))
	}

	/// Adjusted value per unit of input.
	pub fn adjusted_rate(&self) -> Option<Decimal> {
		self.valuation().rate(self.side)
	}

	pub fn sources(&self) -> Vec<Source> {
		self.flags.iter().collect()
	}

	/// Coverage first, then adjusted value.
	pub fn is_better_than(&self, other: &Path) -> bool {
		if self.input != other.input {
			return self.input > other.input;
		}
		self.side.compare_values(&self.valuation(), &other.valuation()) == Ordering::Greater
	}
}

/// The best extension found at one greedy step.
struct Extension {
	sequence: usize,
	fills: Vec<Fill>,
	/// Includes the overhead the extension adds to the path.
	valuation: Valuation,
	exhausts: bool,
}

/// Path search over fill sequences.
pub struct PathOptimizer<'a> {
	side: MarketSide,
	target: U256,
	overhead: &'a dyn OverheadEstimator,
	reference_rate: Decimal,
}

impl<'a> PathOptimizer<'a> {
	/// Creates a new PathOptimizer.
	///
	/// `reference_rate` converts overhead fee units into the comparison unit.
	pub fn new(
		side: MarketSide,
		target: U256,
		overhead: &'a dyn OverheadEstimator,
		reference_rate: Decimal,
	) -> Self {
		Self {
			side,
			target,
			overhead,
			reference_rate,
		}
	}

	pub fn side(&self) -> MarketSide {
		self.side
	}

	pub fn target(&self) -> U256 {
		self.target
	}

	/// Returns the best path drawing from `sequences`.
	///
	/// The result may cover less than the target when liquidity runs out.
	pub fn optimize(&self, sequences: &[&FillSequence]) -> Path {
		let mut best = self.greedy(sequences);

		let sources: BTreeSet<Source> = sequences
			.iter()
			.filter(|sequence| !sequence.is_empty())
			.map(|sequence| sequence.source)
			.collect();
		if sources.len() > 1 {
			for source in sources {
				let isolated: Vec<&FillSequence> = sequences
					.iter()
					.copied()
					.filter(|sequence| sequence.source == source)
					.collect();
				let candidate = self.greedy(&isolated);
				if candidate.is_better_than(&best) {
					debug!(%source, "Single source path beats mixed path");
					best = candidate;
				}
			}
		}

		debug!(
			side = %self.side,
			sources = ?best.sources(),
			input = %best.input,
			output = %best.output,
			cost = %best.valuation().cost,
			"Optimized path"
		);
		best
	}

	/// Overhead in the comparison unit, rounded against the path.
	fn overhead_of(&self, flags: SourceFlags) -> U256 {
		let overhead = self.overhead.estimate_overhead(flags);
		mul_decimal(overhead, self.reference_rate, Rounding::Up).unwrap_or(U256::MAX)
	}

	fn greedy(&self, sequences: &[&FillSequence]) -> Path {
		let mut cursors = vec![0usize; sequences.len()];
		let mut taken: Vec<Fill> = Vec::new();
		let mut first_use: Vec<usize> = Vec::new();
		let mut flags = SourceFlags::EMPTY;
		let mut input = U256::ZERO;

		while input < self.target {
			let remaining = self.target - input;
			let Some(extension) = self.best_extension(sequences, &cursors, flags, remaining) else {
				break;
			};

			let sequence = sequences[extension.sequence];
			if !first_use.contains(&sequence.id) {
				first_use.push(sequence.id);
			}
			flags.insert(sequence.source);
			cursors[extension.sequence] = if extension.exhausts {
				sequence.fills.len()
			} else {
				cursors[extension.sequence] + extension.fills.len()
			};
			input = input.saturating_add(extension.valuation.input);
			debug!(
				source = %sequence.source,
				sequence = sequence.id,
				fills = extension.fills.len(),
				rate = ?extension.valuation.rate(self.side),
				"Extended path"
			);
			taken.extend(extension.fills);
		}

		// Group by sequence in order of first use; within a sequence the fills
		// were taken in index order already.
		taken.sort_by_key(|fill| {
			first_use
				.iter()
				.position(|id| *id == fill.sequence_id)
				.unwrap_or(usize::MAX)
		});

		self.path_from(taken, flags)
	}

	fn best_extension(
		&self,
		sequences: &[&FillSequence],
		cursors: &[usize],
		flags: SourceFlags,
		remaining: U256,
	) -> Option<Extension> {
		let current_overhead = self.overhead_of(flags);
		let mut best: Option<Extension> = None;

		for (position, sequence) in sequences.iter().enumerate() {
			let cursor = cursors[position];
			if cursor >= sequence.fills.len() {
				continue;
			}

			let marginal_overhead = if flags.contains(sequence.source) {
				U256::ZERO
			} else {
				let mut with_source = flags;
				with_source.insert(sequence.source);
				self.overhead_of(with_source).saturating_sub(current_overhead)
			};

			let mut extension = Valuation::default().with_cost(marginal_overhead);
			for end in cursor..sequence.fills.len() {
				let fill = &sequence.fills[end];
				let clipped = extension.input.saturating_add(fill.input) > remaining;
				let fill = if clipped {
					fill.clip(self.side, remaining - extension.input)
				} else {
					fill.clone()
				};
				extension = extension.combine(fill.valuation());

				let improves = best.as_ref().map_or(true, |current| {
					self.side.compare_rates(&extension, &current.valuation) == Ordering::Greater
				});
				if !extension.input.is_zero() && improves {
					let mut fills = sequence.fills[cursor..end].to_vec();
					fills.push(fill);
					best = Some(Extension {
						sequence: position,
						fills,
						valuation: extension,
						exhausts: clipped,
					});
				}

				if extension.input >= remaining {
					break;
				}
			}
		}

		best
	}

	fn path_from(&self, fills: Vec<Fill>, flags: SourceFlags) -> Path {
		Path {
			side: self.side,
			target: self.target,
			input: saturating_sum(fills.iter().map(|fill| fill.input)),
			output: saturating_sum(fills.iter().map(|fill| fill.output)),
			penalty: saturating_sum(fills.iter().map(|fill| fill.penalty)),
			overhead: self.overhead_of(flags),
			flags,
			fills,
		}
	}
}
