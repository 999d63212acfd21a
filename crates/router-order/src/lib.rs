//! Order materialization for the market router.
//!
//! This module collapses an optimized path of fills into executable orders.
//! Native fills become orders that reference the caller's signed order;
//! every other run is routed through a venue bridge whose call data is
//! produced by a pluggable [`OrderEncoder`].

use alloy_primitives::U256;
use router_types::math::{mul_decimal, saturating_sum, Rounding};
use router_types::{
	EncodedBridgeCall, Fill, FillData, FillDataKind, MarketSide, OptimizedOrder, OrderExecution,
	Source, TokenPair,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Re-export implementations
pub mod implementations {
	pub mod bridge;
}

/// Errors that can occur while materializing orders.
#[derive(Debug, Error)]
pub enum OrderError {
	/// The fill payload does not have the shape its source produces.
	#[error("Unsupported fill data for {0}: got {1:?}")]
	UnsupportedFillData(Source, FillDataKind),
	/// No bridge contract is registered for the source.
	#[error("No bridge registered for {0}")]
	UnknownBridge(Source),
	/// There are no fills to materialize.
	#[error("Cannot materialize an empty path")]
	EmptyPath,
}

/// Trait defining the venue-specific encoding collaborator.
///
/// Implementations turn a source and its fill payload into the bridge call
/// that trades `pair.taker_token` for `pair.maker_token` on that venue.
pub trait OrderEncoder: Send + Sync {
	fn encode(
		&self,
		source: Source,
		fill_data: &FillData,
		pair: TokenPair,
	) -> Result<EncodedBridgeCall, OrderError>;
}

/// Collapses paths into [`OptimizedOrder`]s.
#[derive(Clone)]
pub struct OrderMaterializer {
	encoder: Arc<dyn OrderEncoder>,
}

impl OrderMaterializer {
	/// Creates a new OrderMaterializer using the given encoder for bridge orders.
	pub fn new(encoder: Arc<dyn OrderEncoder>) -> Self {
		Self { encoder }
	}

	/// Builds one order per run of consecutive fills from the same sequence.
	///
	/// Bridge orders get `bridge_slippage` applied to their output: sell
	/// outputs are reduced and rounded down, buy costs are increased and
	/// rounded up. Native orders record the consumed amounts unchanged.
	pub fn materialize(
		&self,
		side: MarketSide,
		pair: TokenPair,
		path: &[Fill],
		bridge_slippage: Decimal,
		is_fallback: bool,
	) -> Result<Vec<OptimizedOrder>, OrderError> {
		if path.is_empty() {
			return Err(OrderError::EmptyPath);
		}

		let mut orders = Vec::new();
		for run in path.chunk_by(|a, b| a.sequence_id == b.sequence_id) {
			orders.push(self.materialize_run(side, pair, run, bridge_slippage, is_fallback)?);
		}

		debug!(
			%side,
			orders = orders.len(),
			fills = path.len(),
			is_fallback,
			"Materialized path"
		);
		Ok(orders)
	}

	fn materialize_run(
		&self,
		side: MarketSide,
		pair: TokenPair,
		run: &[Fill],
		bridge_slippage: Decimal,
		is_fallback: bool,
	) -> Result<OptimizedOrder, OrderError> {
		// chunk_by never yields an empty run
		let first = &run[0];
		let source = first.source;
		let fill_data = first.fill_data.clone();

		if !FillDataKind::for_source(source).matches(&fill_data) {
			return Err(OrderError::UnsupportedFillData(source, fill_data.kind()));
		}

		let input_amount = saturating_sum(run.iter().map(|fill| fill.input));
		let output_amount = saturating_sum(run.iter().map(|fill| fill.output));

		let (execution, guaranteed_output) = match fill_data.as_ref() {
			FillData::Native(order) => (
				OrderExecution::Native {
					order: order.clone(),
				},
				output_amount,
			),
			payload => {
				let call = self.encoder.encode(source, payload, pair)?;
				(
					OrderExecution::Bridge { call },
					apply_slippage(side, output_amount, bridge_slippage),
				)
			}
		};

		let (maker_amount, taker_amount) = match side {
			MarketSide::Sell => (guaranteed_output, input_amount),
			MarketSide::Buy => (input_amount, guaranteed_output),
		};

		Ok(OptimizedOrder {
			side,
			source,
			fill_data,
			input_amount,
			output_amount,
			maker_amount,
			taker_amount,
			is_fallback,
			execution,
			fills: run.to_vec(),
		})
	}
}

/// Buffers an output amount against price movement.
///
/// A sell output that cannot be buffered guarantees nothing; a buy cost
/// that overflows is capped at the largest amount.
pub fn apply_slippage(side: MarketSide, output: U256, slippage: Decimal) -> U256 {
	match side {
		MarketSide::Sell => {
			mul_decimal(output, Decimal::ONE - slippage, Rounding::Down).unwrap_or(U256::ZERO)
		}
		MarketSide::Buy => {
			mul_decimal(output, Decimal::ONE + slippage, Rounding::Up).unwrap_or(U256::MAX)
		}
	}
}
