//! Sampler backed by fixed piecewise-linear rate curves.
//!
//! Each source is described by the marginal rate of each sample step. This
//! is the sampler used for offline planning of recorded scenarios and for
//! exercising the router without a chain connection.

use crate::{QuoteRequest, Sampler, SamplerError, TwoHopRequest};
use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use router_types::math::{div_decimal, mul_decimal, Rounding};
use router_types::{DexSample, FillData, HopFill, MarketSide, NativeOrder, Source, TokenPair};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Marginal rates of one venue.
///
/// `rates[i]` is the maker-per-taker rate of the increment between sample
/// `i - 1` and sample `i`. Past the last entry the final rate continues. A
/// zero rate means the venue has no liquidity from that point on. Each
/// step's output is rounded on its own, in the venue's favour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateCurve {
	pub rates: Vec<Decimal>,
	pub fill_data: Arc<FillData>,
}

/// A two-leg route served by [`CurveSampler`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoHopRoute {
	pub intermediate_token: Address,
	pub first_source: Source,
	pub first_rate: Decimal,
	pub second_source: Source,
	pub second_rate: Decimal,
}

/// Sampler serving deterministic samples from configured rate curves.
#[derive(Debug, Clone, Default)]
pub struct CurveSampler {
	curves: BTreeMap<Source, RateCurve>,
	failing: Vec<Source>,
	fillable_taker: HashMap<B256, U256>,
	reference_rate: Decimal,
	two_hop_routes: Vec<TwoHopRoute>,
}

impl CurveSampler {
	pub fn new() -> Self {
		Self {
			reference_rate: Decimal::ONE,
			..Self::default()
		}
	}

	pub fn with_curve(mut self, source: Source, rates: Vec<Decimal>, fill_data: FillData) -> Self {
		self.curves.insert(
			source,
			RateCurve {
				rates,
				fill_data: Arc::new(fill_data),
			},
		);
		self
	}

	/// Makes every request for `source` revert.
	pub fn with_failing(mut self, source: Source) -> Self {
		self.failing.push(source);
		self
	}

	/// Overrides the remaining fillable taker amount of an order.
	pub fn with_fillable(mut self, order_hash: B256, taker_amount: U256) -> Self {
		self.fillable_taker.insert(order_hash, taker_amount);
		self
	}

	pub fn with_reference_rate(mut self, rate: Decimal) -> Self {
		self.reference_rate = rate;
		self
	}

	pub fn with_two_hop(mut self, route: TwoHopRoute) -> Self {
		self.two_hop_routes.push(route);
		self
	}

	fn curve(&self, source: Source) -> Result<Option<&RateCurve>, SamplerError> {
		if self.failing.contains(&source) {
			return Err(SamplerError::Reverted(source));
		}
		Ok(self.curves.get(&source))
	}

	fn fillable_taker_amount(&self, order: &NativeOrder) -> U256 {
		self.fillable_taker
			.get(&order.hash)
			.copied()
			.unwrap_or(order.taker_amount)
			.min(order.taker_amount)
	}

	/// Output of one step of `step` input at `rate`.
	fn step_output(side: MarketSide, step: U256, rate: Decimal) -> Option<U256> {
		match side {
			MarketSide::Sell => mul_decimal(step, rate, Rounding::Down),
			MarketSide::Buy => div_decimal(step, rate, Rounding::Up),
		}
	}

	fn sample(side: MarketSide, source: Source, curve: &RateCurve, amounts: &[U256]) -> Vec<DexSample> {
		let mut samples = Vec::with_capacity(amounts.len());
		let mut previous = U256::ZERO;
		let mut output = U256::ZERO;

		for (i, amount) in amounts.iter().enumerate() {
			let rate = curve
				.rates
				.get(i)
				.or_else(|| curve.rates.last())
				.copied()
				.unwrap_or(Decimal::ZERO);
			if rate <= Decimal::ZERO || *amount < previous {
				break;
			}
			let Some(step) = Self::step_output(side, *amount - previous, rate) else {
				break;
			};
			output = output.saturating_add(step);
			previous = *amount;

			samples.push(DexSample::new(source, *amount, output, curve.fill_data.clone()));
		}

		samples
	}
}

#[async_trait]
impl Sampler for CurveSampler {
	async fn get_order_fillable_taker_amounts(
		&self,
		orders: &[NativeOrder],
	) -> Result<Vec<U256>, SamplerError> {
		Ok(orders
			.iter()
			.map(|order| self.fillable_taker_amount(order))
			.collect())
	}

	async fn get_order_fillable_maker_amounts(
		&self,
		orders: &[NativeOrder],
	) -> Result<Vec<U256>, SamplerError> {
		Ok(orders
			.iter()
			.map(|order| {
				order
					.maker_for_taker(self.fillable_taker_amount(order))
					.unwrap_or(U256::ZERO)
			})
			.collect())
	}

	async fn get_sell_quotes(&self, request: &QuoteRequest) -> Result<Vec<DexSample>, SamplerError> {
		Ok(self
			.curve(request.source)?
			.map(|curve| Self::sample(MarketSide::Sell, request.source, curve, &request.amounts))
			.unwrap_or_default())
	}

	async fn get_buy_quotes(&self, request: &QuoteRequest) -> Result<Vec<DexSample>, SamplerError> {
		if request.source == Source::Bancor {
			return Err(SamplerError::Unsupported(request.source, MarketSide::Buy));
		}
		Ok(self
			.curve(request.source)?
			.map(|curve| Self::sample(MarketSide::Buy, request.source, curve, &request.amounts))
			.unwrap_or_default())
	}

	async fn get_median_rate(
		&self,
		_sources: &[Source],
		_pair: TokenPair,
		_amount: U256,
	) -> Result<Decimal, SamplerError> {
		Ok(self.reference_rate)
	}

	async fn get_two_hop_quotes(
		&self,
		side: MarketSide,
		request: &TwoHopRequest,
	) -> Result<Vec<DexSample>, SamplerError> {
		let samples = self
			.two_hop_routes
			.iter()
			.filter(|route| route.intermediate_token == request.intermediate_token)
			.filter(|route| {
				request.sources.contains(&route.first_source)
					&& request.sources.contains(&route.second_source)
			})
			.filter_map(|route| {
				let (middle, output) = match side {
					MarketSide::Sell => {
						let middle = Self::step_output(side, request.amount, route.first_rate)?;
						(middle, Self::step_output(side, middle, route.second_rate)?)
					}
					MarketSide::Buy => {
						let middle = Self::step_output(side, request.amount, route.second_rate)?;
						(middle, Self::step_output(side, middle, route.first_rate)?)
					}
				};
				if middle.is_zero() || output.is_zero() {
					return None;
				}
				let hop = |source: Source, input: U256, output: U256| HopFill {
					source,
					fill_data: self
						.curves
						.get(&source)
						.map(|curve| curve.fill_data.clone())
						.unwrap_or_else(|| Arc::new(FillData::Empty)),
					input,
					output,
				};
				let (first_hop, second_hop) = match side {
					MarketSide::Sell => (
						hop(route.first_source, request.amount, middle),
						hop(route.second_source, middle, output),
					),
					MarketSide::Buy => (
						hop(route.first_source, output, middle),
						hop(route.second_source, middle, request.amount),
					),
				};
				Some(DexSample::new(
					Source::MultiHop,
					request.amount,
					output,
					Arc::new(FillData::MultiHop {
						intermediate_token: route.intermediate_token,
						first_hop,
						second_hop,
					}),
				))
			})
			.collect();

		Ok(samples)
	}
}
