//! Fee and overhead capabilities.
//!
//! Fees are charged per venue call and are converted into the comparison
//! unit by the reference rate. Overhead is a fixed cost paid once for each
//! distinct source a path uses.

use crate::sources::default_gas;
use alloy_primitives::U256;
use router_types::{FillData, Source, SourceFlags};
use std::collections::BTreeMap;

/// Trait defining the per-fill fee capability.
pub trait FeeEstimator: Send + Sync {
	/// Cost of one venue call in fee units (wei).
	fn estimate_fee(&self, source: Source, fill_data: &FillData) -> U256;
}

/// Trait defining the fixed execution overhead capability.
pub trait OverheadEstimator: Send + Sync {
	/// Fixed cost in fee units of a path drawing from every source in `flags`.
	fn estimate_overhead(&self, flags: SourceFlags) -> U256;
}

/// Explicit fee per source; sources without an entry are free.
#[derive(Debug, Clone, Default)]
pub struct FixedFeeSchedule {
	fees: BTreeMap<Source, U256>,
}

impl FixedFeeSchedule {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_fee(mut self, source: Source, fee: U256) -> Self {
		self.fees.insert(source, fee);
		self
	}
}

impl FeeEstimator for FixedFeeSchedule {
	fn estimate_fee(&self, source: Source, _fill_data: &FillData) -> U256 {
		self.fees.get(&source).copied().unwrap_or(U256::ZERO)
	}
}

/// Fee derived from the gas cost of each venue call.
///
/// Sources without an explicit override use the registry gas schedule.
#[derive(Debug, Clone)]
pub struct GasFeeSchedule {
	gas_price: U256,
	gas: BTreeMap<Source, u64>,
}

impl GasFeeSchedule {
	pub fn new(gas_price: U256) -> Self {
		Self {
			gas_price,
			gas: BTreeMap::new(),
		}
	}

	pub fn with_gas(mut self, source: Source, gas: u64) -> Self {
		self.gas.insert(source, gas);
		self
	}
}

impl FeeEstimator for GasFeeSchedule {
	fn estimate_fee(&self, source: Source, fill_data: &FillData) -> U256 {
		let gas = self
			.gas
			.get(&source)
			.copied()
			.unwrap_or_else(|| default_gas(source, fill_data));
		U256::from(gas).saturating_mul(self.gas_price)
	}
}

/// Overhead that is zero for every path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOverhead;

impl OverheadEstimator for NoOverhead {
	fn estimate_overhead(&self, _flags: SourceFlags) -> U256 {
		U256::ZERO
	}
}

/// Overhead summing a fixed gas amount per source in the path.
#[derive(Debug, Clone)]
pub struct GasOverhead {
	gas_price: U256,
	gas: BTreeMap<Source, u64>,
	default_gas: u64,
}

impl GasOverhead {
	pub fn new(gas_price: U256) -> Self {
		Self {
			gas_price,
			gas: BTreeMap::new(),
			default_gas: 0,
		}
	}

	pub fn with_gas(mut self, source: Source, gas: u64) -> Self {
		self.gas.insert(source, gas);
		self
	}

	/// Gas charged for sources without their own entry.
	pub fn with_default_gas(mut self, gas: u64) -> Self {
		self.default_gas = gas;
		self
	}
}

impl OverheadEstimator for GasOverhead {
	fn estimate_overhead(&self, flags: SourceFlags) -> U256 {
		let gas = flags
			.iter()
			.map(|source| U256::from(self.gas.get(&source).copied().unwrap_or(self.default_gas)))
			.fold(U256::ZERO, |total, gas| total.saturating_add(gas));
		gas.saturating_mul(self.gas_price)
	}
}
