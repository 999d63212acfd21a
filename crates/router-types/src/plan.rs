//! Output types of a routing plan.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{Fill, FillData, MarketSide, NativeOrder, Source};

/// A venue call produced by an order encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedBridgeCall {
	/// Bridge contract that executes the venue trade.
	pub target: Address,
	/// ABI-encoded bridge data.
	pub payload: Bytes,
}

/// How an optimized order is executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OrderExecution {
	/// Fill the caller's signed order directly.
	Native { order: NativeOrder },
	/// Route through a venue adapter.
	Bridge { call: EncodedBridgeCall },
}

/// One executable order covering a contiguous run of fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedOrder {
	pub side: MarketSide,
	pub source: Source,
	pub fill_data: Arc<FillData>,
	/// Summed fill input, before slippage.
	pub input_amount: U256,
	/// Summed fill output, before slippage.
	pub output_amount: U256,
	/// Maker amount the order is built for, after slippage.
	pub maker_amount: U256,
	/// Taker amount the order is built for, after slippage.
	pub taker_amount: U256,
	/// Set for orders that belong to the fallback path.
	pub is_fallback: bool,
	pub execution: OrderExecution,
	pub fills: Vec<Fill>,
}

/// Diagnostic record for a single venue or native order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
	pub source: Source,
	/// Largest sampled input.
	pub input: U256,
	/// Output at the largest sampled input.
	pub output: U256,
	/// Whether the primary or fallback path drew from this entry.
	pub used: bool,
}

/// Diagnostics about the sources a plan considered. Informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteReport {
	pub side: MarketSide,
	pub sources_queried: Vec<Source>,
	pub sources_used: Vec<Source>,
	pub fallback_sources: Vec<Source>,
	pub entries: Vec<ReportEntry>,
}
