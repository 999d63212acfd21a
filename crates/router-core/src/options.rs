//! Per-call planning options.

use crate::fees::{FeeEstimator, FixedFeeSchedule, GasFeeSchedule, GasOverhead, NoOverhead, OverheadEstimator};
use crate::RouterError;
use alloy_primitives::Address;
use router_config::RouterConfig;
use router_types::Source;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;

/// Options of a single `plan_sell` / `plan_buy` call.
#[derive(Clone)]
pub struct PlanOptions {
	/// Number of sample points per venue curve.
	pub num_samples: usize,
	/// Exponent base spacing the sample points.
	pub sample_distribution_base: Decimal,
	/// Fraction applied to every bridge order.
	pub bridge_slippage: Decimal,
	/// Fallback value loss below which the fallback is omitted.
	pub max_fallback_slippage: Decimal,
	pub excluded_sources: Vec<Source>,
	/// When non-empty, the only venues considered.
	pub included_sources: Vec<Source>,
	pub allow_fallback: bool,
	/// Middle tokens of two-hop routes.
	pub intermediate_tokens: Vec<Address>,
	pub fee_schedule: Arc<dyn FeeEstimator>,
	pub exchange_proxy_overhead: Arc<dyn OverheadEstimator>,
}

impl Default for PlanOptions {
	fn default() -> Self {
		Self {
			num_samples: 13,
			sample_distribution_base: Decimal::new(105, 2),
			bridge_slippage: Decimal::new(5, 3),
			max_fallback_slippage: Decimal::new(5, 2),
			excluded_sources: Vec::new(),
			included_sources: Vec::new(),
			allow_fallback: true,
			intermediate_tokens: Vec::new(),
			fee_schedule: Arc::new(FixedFeeSchedule::new()),
			exchange_proxy_overhead: Arc::new(NoOverhead),
		}
	}
}

impl fmt::Debug for PlanOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PlanOptions")
			.field("num_samples", &self.num_samples)
			.field("sample_distribution_base", &self.sample_distribution_base)
			.field("bridge_slippage", &self.bridge_slippage)
			.field("max_fallback_slippage", &self.max_fallback_slippage)
			.field("excluded_sources", &self.excluded_sources)
			.field("included_sources", &self.included_sources)
			.field("allow_fallback", &self.allow_fallback)
			.field("intermediate_tokens", &self.intermediate_tokens)
			.finish_non_exhaustive()
	}
}

impl PlanOptions {
	/// Builds options from configuration, pricing fees and overhead in gas.
	pub fn from_config(config: &RouterConfig) -> Self {
		let gas_price = config.gas.gas_price;

		let fee_schedule = config
			.gas
			.fee_schedule
			.iter()
			.fold(GasFeeSchedule::new(gas_price), |schedule, (source, gas)| {
				schedule.with_gas(*source, *gas)
			});
		let overhead = config.gas.overhead.iter().fold(
			GasOverhead::new(gas_price).with_default_gas(config.gas.default_overhead),
			|overhead, (source, gas)| overhead.with_gas(*source, *gas),
		);

		Self {
			num_samples: config.sampling.num_samples,
			sample_distribution_base: config.sampling.sample_distribution_base,
			bridge_slippage: config.slippage.bridge_slippage,
			max_fallback_slippage: config.slippage.max_fallback_slippage,
			excluded_sources: config.sources.excluded.clone(),
			included_sources: config.sources.included.clone(),
			allow_fallback: config.sources.allow_fallback,
			intermediate_tokens: config.sources.intermediate_tokens.clone(),
			fee_schedule: Arc::new(fee_schedule),
			exchange_proxy_overhead: Arc::new(overhead),
		}
	}

	pub fn with_fee_schedule(mut self, fee_schedule: impl FeeEstimator + 'static) -> Self {
		self.fee_schedule = Arc::new(fee_schedule);
		self
	}

	pub fn with_overhead(mut self, overhead: impl OverheadEstimator + 'static) -> Self {
		self.exchange_proxy_overhead = Arc::new(overhead);
		self
	}

	/// Whether the source filters let `source` through.
	pub fn is_allowed(&self, source: Source) -> bool {
		crate::sources::is_allowed(source, &self.excluded_sources, &self.included_sources)
	}

	pub fn validate(&self) -> Result<(), RouterError> {
		if self.num_samples == 0 {
			return Err(RouterError::InvalidOptions(
				"num_samples must be at least 1".to_string(),
			));
		}
		if self.sample_distribution_base <= Decimal::ZERO {
			return Err(RouterError::InvalidOptions(
				"sample_distribution_base must be positive".to_string(),
			));
		}
		if self.bridge_slippage.is_sign_negative() {
			return Err(RouterError::InvalidOptions(
				"bridge_slippage must not be negative".to_string(),
			));
		}
		if self.bridge_slippage > Decimal::ONE {
			return Err(RouterError::InvalidOptions(
				"bridge_slippage must not exceed 1".to_string(),
			));
		}
		if self.max_fallback_slippage.is_sign_negative() {
			return Err(RouterError::InvalidOptions(
				"max_fallback_slippage must not be negative".to_string(),
			));
		}
		Ok(())
	}
}
