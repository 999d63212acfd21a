//! Normalization of native orders and venue samples into fills.
//!
//! Every native order, every sampled venue and every two-hop route becomes
//! one [`FillSequence`]. Sequence ids are assigned in that order, which is
//! also the optimizer's precedence order on ties.

use crate::fees::FeeEstimator;
use alloy_primitives::U256;
use router_sampler::SourceSamples;
use router_types::math::{mul_decimal, saturating_sum, Rounding};
use router_types::{DexSample, Fill, FillData, MarketSide, NativeOrder, Source};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

/// Fills that must be consumed in `index` order.
#[derive(Debug, Clone, PartialEq)]
pub struct FillSequence {
	pub id: usize,
	pub source: Source,
	pub fills: Vec<Fill>,
}

impl FillSequence {
	pub fn is_empty(&self) -> bool {
		self.fills.is_empty()
	}

	pub fn total_input(&self) -> U256 {
		saturating_sum(self.fills.iter().map(|fill| fill.input))
	}

	pub fn total_output(&self) -> U256 {
		saturating_sum(self.fills.iter().map(|fill| fill.output))
	}
}

/// Builds fee-adjusted fill sequences for one market operation.
pub struct FillBuilder<'a> {
	side: MarketSide,
	target: U256,
	reference_rate: Decimal,
	fees: &'a dyn FeeEstimator,
}

impl<'a> FillBuilder<'a> {
	pub fn new(
		side: MarketSide,
		target: U256,
		reference_rate: Decimal,
		fees: &'a dyn FeeEstimator,
	) -> Self {
		Self {
			side,
			target,
			reference_rate,
			fees,
		}
	}

	/// Builds every sequence: native orders first, in caller order, then
	/// venues in the order given, then two-hop routes.
	///
	/// `fillable` holds the remaining fillable input of each native order.
	pub fn build(
		&self,
		orders: &[NativeOrder],
		fillable: &[U256],
		venues: &[SourceSamples],
		two_hop: &[DexSample],
	) -> Vec<FillSequence> {
		let mut sequences = Vec::with_capacity(orders.len() + venues.len() + two_hop.len());

		for (order, fillable) in orders.iter().zip(fillable) {
			let id = sequences.len();
			sequences.push(FillSequence {
				id,
				source: Source::Native,
				fills: self.native_fill(id, order, *fillable).into_iter().collect(),
			});
		}

		for venue in venues {
			let id = sequences.len();
			sequences.push(FillSequence {
				id,
				source: venue.source,
				fills: self.dex_fills(id, &venue.samples),
			});
		}

		for sample in two_hop {
			let id = sequences.len();
			sequences.push(FillSequence {
				id,
				source: sample.source,
				fills: self.dex_fills(id, std::slice::from_ref(sample)),
			});
		}

		debug!(
			side = %self.side,
			sequences = sequences.len(),
			fills = sequences.iter().map(|s| s.fills.len()).sum::<usize>(),
			"Built fill sequences"
		);
		sequences
	}

	/// The fee of one venue call, in the comparison unit, rounded against
	/// the fill.
	fn penalty(&self, source: Source, fill_data: &FillData) -> U256 {
		let fee = self.fees.estimate_fee(source, fill_data);
		mul_decimal(fee, self.reference_rate, Rounding::Up).unwrap_or(U256::MAX)
	}

	/// A native order capped at the target, or nothing if it cannot
	/// contribute.
	fn native_fill(&self, sequence_id: usize, order: &NativeOrder, fillable: U256) -> Option<Fill> {
		let input = fillable.min(self.target);
		if input.is_zero() {
			return None;
		}

		let output = match self.side {
			MarketSide::Sell => order.maker_for_taker(input)?,
			MarketSide::Buy => order.taker_for_maker(input)?,
		};
		let fill_data = Arc::new(FillData::Native(order.clone()));
		let penalty = self.penalty(Source::Native, &fill_data);

		if self.side == MarketSide::Sell && output <= penalty {
			debug!(order = %order.hash, "Skipping native order worth less than its fee");
			return None;
		}

		Some(Fill {
			source: Source::Native,
			fill_data,
			sequence_id,
			index: 0,
			input,
			output,
			penalty,
		})
	}

	/// Increments between consecutive cumulative samples.
	///
	/// Samples without output are dropped and the curve ends at the first
	/// sample that does not move both input and output forward.
	fn dex_fills(&self, sequence_id: usize, samples: &[DexSample]) -> Vec<Fill> {
		let mut fills: Vec<Fill> = Vec::new();
		let mut previous_input = U256::ZERO;
		let mut previous_output = U256::ZERO;

		for sample in samples {
			if sample.output.is_zero() {
				continue;
			}
			if sample.input <= previous_input || sample.output <= previous_output {
				break;
			}

			// A contiguous run of a curve is one venue call.
			let penalty = if fills.is_empty() {
				self.penalty(sample.source, &sample.fill_data)
			} else {
				U256::ZERO
			};

			fills.push(Fill {
				source: sample.source,
				fill_data: sample.fill_data.clone(),
				sequence_id,
				index: fills.len(),
				input: sample.input - previous_input,
				output: sample.output - previous_output,
				penalty,
			});
			previous_input = sample.input;
			previous_output = sample.output;
		}

		fills
	}
}
