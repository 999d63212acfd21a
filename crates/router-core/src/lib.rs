//! Core planning engine for the market router.
//!
//! This crate turns native orders and sampled venue liquidity into an
//! execution plan. It coordinates the sampler, fill builder, path optimizer,
//! fallback generator and order materializer, and exposes the `plan_sell`
//! and `plan_buy` entry points.

use alloy_primitives::{Address, U256};
use router_config::RouterConfig;
use router_order::implementations::bridge::BridgeAddressEncoder;
use router_order::{OrderEncoder, OrderError, OrderMaterializer};
use router_sampler::{get_sample_amounts, Sampler, SamplerService};
use router_types::{
	MarketSide, NativeOrder, OptimizedOrder, QuoteReport, ReportEntry, Source, SourceFlags,
	TokenPair,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub mod fallback;
pub mod fees;
pub mod fills;
pub mod options;
pub mod path_optimizer;
pub mod sources;

use fallback::FallbackGenerator;
use fills::{FillBuilder, FillSequence};
pub use options::PlanOptions;
use path_optimizer::{Path, PathOptimizer};

/// Errors that can occur while planning.
#[derive(Debug, Error)]
pub enum RouterError {
	#[error("No native orders supplied")]
	EmptyOrders,
	#[error("Native orders do not share one token pair")]
	MismatchedOrders,
	#[error("Invalid options: {0}")]
	InvalidOptions(String),
	#[error("Order error: {0}")]
	Order(#[from] OrderError),
}

/// Outcome of a planning call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResult {
	/// Primary orders followed by fallback orders.
	pub optimized_orders: Vec<OptimizedOrder>,
	pub report: QuoteReport,
}

/// Base units of one fee token.
fn fee_token_unit() -> U256 {
	U256::from(1_000_000_000_000_000_000u64)
}

/// Entry point of the planning engine.
///
/// Holds only read-only collaborators, so one router can serve concurrent
/// calls.
#[derive(Clone)]
pub struct MarketRouter {
	sampler: SamplerService,
	materializer: OrderMaterializer,
	/// Token fees are denominated in.
	weth: Address,
	liquidity_provider_registry: Option<Address>,
}

impl MarketRouter {
	/// Creates a new MarketRouter.
	///
	/// Supplying a liquidity provider registry enables the
	/// [`Source::LiquidityProvider`] venue.
	pub fn new(
		sampler: SamplerService,
		encoder: Arc<dyn OrderEncoder>,
		weth: Address,
		liquidity_provider_registry: Option<Address>,
	) -> Self {
		Self {
			sampler,
			materializer: OrderMaterializer::new(encoder),
			weth,
			liquidity_provider_registry,
		}
	}

	/// Creates a router whose bridge addresses, tokens and sampling timeout
	/// come from configuration.
	pub fn from_config(sampler: Arc<dyn Sampler>, config: &RouterConfig) -> Self {
		let mut service = SamplerService::new(sampler);
		if let Some(timeout_ms) = config.sampling.sample_timeout_ms {
			service = service.with_timeout(Duration::from_millis(timeout_ms));
		}
		let encoder = BridgeAddressEncoder::new(config.sources.bridges.clone());

		Self::new(
			service,
			Arc::new(encoder),
			config.tokens.weth,
			config.sources.liquidity_provider_registry,
		)
	}

	/// Plans selling exactly `taker_amount` of the orders' taker token.
	pub async fn plan_sell(
		&self,
		orders: &[NativeOrder],
		taker_amount: U256,
		options: &PlanOptions,
	) -> Result<PlanResult, RouterError> {
		let pair = orders.first().ok_or(RouterError::EmptyOrders)?.pair();
		self.plan(MarketSide::Sell, pair, orders, taker_amount, options)
			.await
	}

	/// Plans buying exactly `maker_amount` of the orders' maker token.
	pub async fn plan_buy(
		&self,
		orders: &[NativeOrder],
		maker_amount: U256,
		options: &PlanOptions,
	) -> Result<PlanResult, RouterError> {
		let pair = orders.first().ok_or(RouterError::EmptyOrders)?.pair();
		self.plan(MarketSide::Buy, pair, orders, maker_amount, options)
			.await
	}

	/// Plans a market operation on `pair`; `orders` may be empty.
	///
	/// Running out of liquidity is not an error: the plan then covers less
	/// than `amount`, which callers detect by summing order inputs.
	pub async fn plan(
		&self,
		side: MarketSide,
		pair: TokenPair,
		orders: &[NativeOrder],
		amount: U256,
		options: &PlanOptions,
	) -> Result<PlanResult, RouterError> {
		options.validate()?;
		if amount.is_zero() {
			return Err(RouterError::InvalidOptions(
				"amount must be positive".to_string(),
			));
		}
		if orders.iter().any(|order| order.pair() != pair) {
			return Err(RouterError::MismatchedOrders);
		}

		let sources = sources::sampled_sources(
			side,
			&options.excluded_sources,
			&options.included_sources,
			self.liquidity_provider_registry,
		);
		let two_hop_enabled =
			options.is_allowed(Source::MultiHop) && !options.intermediate_tokens.is_empty();
		let amounts = get_sample_amounts(
			amount,
			options.num_samples,
			options.sample_distribution_base,
		);

		let (fillable, venues, reference_rate, two_hop) = tokio::join!(
			self.sampler.fillable_amounts(side, orders),
			self.sampler.sample_quotes(
				side,
				&sources,
				pair,
				&amounts,
				self.liquidity_provider_registry,
			),
			self.sampler.reference_rate(
				&sources,
				pair.output_token(side),
				self.weth,
				fee_token_unit(),
			),
			async {
				if two_hop_enabled {
					self.sampler
						.two_hop_quotes(
							side,
							&sources,
							pair,
							&options.intermediate_tokens,
							amount,
							self.liquidity_provider_registry,
						)
						.await
				} else {
					Vec::new()
				}
			},
		);

		let sequences = FillBuilder::new(
			side,
			amount,
			reference_rate,
			options.fee_schedule.as_ref(),
		)
		.build(orders, &fillable, &venues, &two_hop);

		let optimizer = PathOptimizer::new(
			side,
			amount,
			options.exchange_proxy_overhead.as_ref(),
			reference_rate,
		);
		let primary = optimizer.optimize(&sequences.iter().collect::<Vec<_>>());
		let fallback = FallbackGenerator::new(&optimizer, options.max_fallback_slippage).generate(
			&primary,
			&sequences,
			options.allow_fallback,
		);

		let mut optimized_orders = Vec::new();
		if primary.is_empty() {
			warn!(%side, %amount, "No liquidity available for any source");
		} else {
			optimized_orders = self.materializer.materialize(
				side,
				pair,
				&primary.fills,
				options.bridge_slippage,
				false,
			)?;
			if let Some(fallback) = &fallback {
				optimized_orders.extend(self.materializer.materialize(
					side,
					pair,
					&fallback.fills,
					options.bridge_slippage,
					true,
				)?);
			}
		}

		let mut queried: SourceFlags = sources.iter().copied().collect();
		if !orders.is_empty() {
			queried.insert(Source::Native);
		}
		if two_hop_enabled {
			queried.insert(Source::MultiHop);
		}
		let report = build_report(side, queried, &sequences, &primary, fallback.as_ref());

		info!(
			%side,
			%amount,
			filled = %primary.input,
			orders = optimized_orders.len(),
			sources = ?report.sources_used,
			fallback = ?report.fallback_sources,
			"Planned market operation"
		);

		Ok(PlanResult {
			optimized_orders,
			report,
		})
	}
}

fn build_report(
	side: MarketSide,
	queried: SourceFlags,
	sequences: &[FillSequence],
	primary: &Path,
	fallback: Option<&Path>,
) -> QuoteReport {
	let used = |id: usize| {
		primary
			.fills
			.iter()
			.chain(fallback.iter().flat_map(|path| path.fills.iter()))
			.any(|fill| fill.sequence_id == id)
	};

	QuoteReport {
		side,
		sources_queried: queried.iter().collect(),
		sources_used: primary.sources(),
		fallback_sources: fallback.map(Path::sources).unwrap_or_default(),
		entries: sequences
			.iter()
			.map(|sequence| ReportEntry {
				source: sequence.source,
				input: sequence.total_input(),
				output: sequence.total_output(),
				used: used(sequence.id),
			})
			.collect(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fees::{FixedFeeSchedule, GasOverhead};
	use alloy_primitives::{FixedBytes, B256};
	use router_sampler::implementations::curve::{CurveSampler, TwoHopRoute};
	use router_types::math::saturating_sum;
	use router_types::{CurvePoolInfo, FillData, NativeOrderKind, OrderExecution};
	use rust_decimal::Decimal;
	use rust_decimal_macros::dec;
	use std::collections::BTreeMap;

	const ONE_ETHER: u64 = 1_000_000_000_000_000_000;

	fn units(value: u64) -> U256 {
		U256::from(value)
	}

	fn ether() -> U256 {
		units(ONE_ETHER)
	}

	fn maker_token() -> Address {
		Address::repeat_byte(1)
	}

	fn taker_token() -> Address {
		Address::repeat_byte(2)
	}

	fn weth() -> Address {
		Address::repeat_byte(0xee)
	}

	fn native_order(id: u8, maker_amount: U256, taker_amount: U256) -> NativeOrder {
		NativeOrder {
			hash: B256::repeat_byte(id),
			kind: NativeOrderKind::Limit,
			maker: Address::repeat_byte(0x40 + id),
			maker_token: maker_token(),
			taker_token: taker_token(),
			maker_amount,
			taker_amount,
			expiration_time_secs: 0,
			signature: Default::default(),
		}
	}

	/// Payload of the shape `source` produces.
	fn fill_data(source: Source) -> FillData {
		match source {
			Source::UniswapV2 | Source::SushiSwap => FillData::TokenPath {
				token_address_path: vec![taker_token(), maker_token()],
			},
			Source::Curve => FillData::Curve(CurvePoolInfo {
				pool_address: Address::repeat_byte(0xc0),
				exchange_selector: FixedBytes::from([0x3d, 0xf0, 0x21, 0x24]),
				from_token_index: 0,
				to_token_index: 1,
			}),
			Source::Balancer | Source::Mooniswap | Source::Shell | Source::LiquidityProvider => {
				FillData::Pool {
					pool_address: Address::repeat_byte(0xb0),
				}
			}
			_ => FillData::Empty,
		}
	}

	fn router(sampler: CurveSampler, liquidity_provider_registry: Option<Address>) -> MarketRouter {
		let bridges: BTreeMap<Source, Address> = Source::ALL
			.into_iter()
			.map(|source| (source, Address::repeat_byte(0x10 + source.ordinal() as u8)))
			.collect();
		MarketRouter::new(
			SamplerService::new(Arc::new(sampler)),
			Arc::new(BridgeAddressEncoder::new(bridges)),
			weth(),
			liquidity_provider_registry,
		)
	}

	fn with_curve(sampler: CurveSampler, source: Source, rates: Vec<Decimal>) -> CurveSampler {
		sampler.with_curve(source, rates, fill_data(source))
	}

	fn options() -> PlanOptions {
		PlanOptions {
			num_samples: 4,
			sample_distribution_base: Decimal::ONE,
			bridge_slippage: Decimal::ZERO,
			allow_fallback: false,
			..PlanOptions::default()
		}
	}

	fn sources_of(result: &PlanResult) -> Vec<Source> {
		result
			.optimized_orders
			.iter()
			.map(|order| order.source)
			.collect()
	}

	#[tokio::test]
	async fn test_native_fees_rank_against_dex() {
		let quarter = ether() / units(4);
		let orders: Vec<NativeOrder> = [
			250_000_000_000_000_000u64,
			247_500_000_000_000_000,
			245_000_000_000_000_000,
			242_500_000_000_000_000,
		]
		.into_iter()
		.enumerate()
		.map(|(i, maker_amount)| native_order(i as u8 + 1, units(maker_amount), quarter))
		.collect();

		let sampler = with_curve(
			CurveSampler::new().with_reference_rate(dec!(1.5)),
			Source::Uniswap,
			vec![dec!(0.96), dec!(0.1), dec!(0.1), dec!(0.1)],
		);
		let sampler = with_curve(sampler, Source::Curve, vec![dec!(0.1); 4]);
		// Each native fill costs 6% of a quarter once converted at 1.5.
		let fee = units(10_000_000_000_000_000);
		let options = options()
			.with_fee_schedule(FixedFeeSchedule::new().with_fee(Source::Native, fee));

		let result = router(sampler, None)
			.plan_sell(&orders, ether(), &options)
			.await
			.unwrap();

		assert_eq!(
			sources_of(&result),
			vec![Source::Uniswap, Source::Native, Source::Native, Source::Native]
		);
		let native_hashes: Vec<B256> = result
			.optimized_orders
			.iter()
			.filter_map(|order| match &order.execution {
				OrderExecution::Native { order } => Some(order.hash),
				_ => None,
			})
			.collect();
		assert_eq!(
			native_hashes,
			vec![B256::repeat_byte(1), B256::repeat_byte(2), B256::repeat_byte(3)]
		);
	}

	#[tokio::test]
	async fn test_overhead_outweighs_nominal_rate() {
		let sampler = with_curve(CurveSampler::new(), Source::Uniswap, vec![dec!(1)]);
		let sampler = with_curve(sampler, Source::LiquidityProvider, vec![dec!(0.9999)]);
		let gas_price = units(100_000_000_000);
		let options = options().with_overhead(
			GasOverhead::new(gas_price)
				.with_gas(Source::Uniswap, 130_000)
				.with_gas(Source::LiquidityProvider, 30_000),
		);
		let orders = vec![native_order(1, U256::ZERO, ether())];

		let result = router(sampler, Some(Address::repeat_byte(0x99)))
			.plan_sell(&orders, ether(), &options)
			.await
			.unwrap();

		assert_eq!(sources_of(&result), vec![Source::LiquidityProvider]);
		assert_eq!(result.report.sources_used, vec![Source::LiquidityProvider]);
		assert_eq!(result.optimized_orders[0].input_amount, ether());
	}

	#[tokio::test]
	async fn test_uses_fewest_native_clips() {
		let clip = units(100_000_000_000_000_000);
		let orders: Vec<NativeOrder> = (1..=5).map(|i| native_order(i, clip, clip)).collect();
		let options = PlanOptions {
			included_sources: vec![Source::Uniswap],
			..options()
		};

		let result = router(CurveSampler::new(), None)
			.plan_sell(&orders, units(250_000_000_000_000_000), &options)
			.await
			.unwrap();

		let inputs: Vec<U256> = result
			.optimized_orders
			.iter()
			.map(|order| order.taker_amount)
			.collect();
		assert_eq!(inputs, vec![clip, clip, clip / units(2)]);
	}

	#[tokio::test]
	async fn test_native_third_rate_plans_exact_output() {
		let three = ether() * units(3);
		let orders = vec![native_order(1, ether(), three)];
		let options = PlanOptions {
			included_sources: vec![Source::Uniswap],
			..options()
		};

		let result = router(CurveSampler::new(), None)
			.plan_sell(&orders, three, &options)
			.await
			.unwrap();

		assert_eq!(result.optimized_orders[0].output_amount, ether());
		assert_eq!(result.report.entries[0].output, ether());
	}

	#[tokio::test]
	async fn test_identical_inputs_give_identical_plans() {
		let build = || {
			let sampler = with_curve(
				CurveSampler::new(),
				Source::Uniswap,
				vec![dec!(1), dec!(0.9), dec!(0.8), dec!(0.7)],
			);
			let sampler = with_curve(sampler, Source::Curve, vec![dec!(0.95); 4]);
			with_curve(sampler, Source::Balancer, vec![dec!(0.95); 4])
		};
		let clip = units(300_000_000_000_000_000);
		let orders = vec![native_order(1, clip, clip)];
		let options = PlanOptions {
			allow_fallback: true,
			bridge_slippage: dec!(0.01),
			..options()
		};

		let first = router(build(), None)
			.plan_sell(&orders, ether(), &options)
			.await
			.unwrap();
		let second = router(build(), None)
			.plan_sell(&orders, ether(), &options)
			.await
			.unwrap();
		assert_eq!(first, second);
	}

	#[tokio::test]
	async fn test_source_filters_bound_queried_sources() {
		let orders = vec![native_order(1, ether(), ether())];
		let router = router(CurveSampler::new(), None);

		let excluded = PlanOptions {
			excluded_sources: vec![Source::Uniswap, Source::Kyber],
			..options()
		};
		let result = router.plan_sell(&orders, ether(), &excluded).await.unwrap();
		assert!(!result.report.sources_queried.contains(&Source::Uniswap));
		assert!(!result.report.sources_queried.contains(&Source::Kyber));
		assert!(result.report.sources_queried.contains(&Source::Curve));

		let included = PlanOptions {
			excluded_sources: vec![Source::Curve],
			included_sources: vec![Source::Curve, Source::Balancer],
			..options()
		};
		let result = router.plan_buy(&orders, ether(), &included).await.unwrap();
		assert_eq!(
			result.report.sources_queried,
			vec![Source::Native, Source::Curve, Source::Balancer]
		);
	}

	#[tokio::test]
	async fn test_fallback_uses_disjoint_sources() {
		let sampler = with_curve(CurveSampler::new(), Source::Uniswap, vec![dec!(1)]);
		let sampler = with_curve(sampler, Source::Curve, vec![dec!(0.9)]);
		let orders = vec![native_order(1, U256::ZERO, ether())];
		let options = PlanOptions {
			allow_fallback: true,
			max_fallback_slippage: dec!(0.05),
			..options()
		};

		let result = router(sampler, None)
			.plan_sell(&orders, ether(), &options)
			.await
			.unwrap();

		assert_eq!(result.report.sources_used, vec![Source::Uniswap]);
		assert_eq!(result.report.fallback_sources, vec![Source::Curve]);
		let fallback: Vec<&OptimizedOrder> = result
			.optimized_orders
			.iter()
			.filter(|order| order.is_fallback)
			.collect();
		assert_eq!(fallback.len(), 1);
		assert_eq!(fallback[0].source, Source::Curve);
	}

	#[tokio::test]
	async fn test_plan_covers_target_when_liquidity_suffices() {
		// Uniswap runs dry halfway; Curve covers the rest.
		let sampler = with_curve(
			CurveSampler::new(),
			Source::Uniswap,
			vec![dec!(1), dec!(1), dec!(0)],
		);
		let sampler = with_curve(sampler, Source::Curve, vec![dec!(0.5)]);
		let orders = vec![native_order(1, U256::ZERO, ether())];

		let result = router(sampler, None)
			.plan_sell(&orders, ether(), &options())
			.await
			.unwrap();

		let filled = saturating_sum(result.optimized_orders.iter().map(|order| order.input_amount));
		assert_eq!(filled, ether());
		assert_eq!(sources_of(&result), vec![Source::Uniswap, Source::Curve]);
	}

	#[tokio::test]
	async fn test_insufficient_liquidity_is_partial_not_error() {
		let sampler = with_curve(CurveSampler::new(), Source::Uniswap, vec![dec!(1), dec!(0)]);
		let orders = vec![native_order(1, U256::ZERO, ether())];

		let result = router(sampler, None)
			.plan_sell(&orders, ether(), &options())
			.await
			.unwrap();

		assert_eq!(result.optimized_orders.len(), 1);
		assert_eq!(result.optimized_orders[0].input_amount, ether() / units(4));
	}

	#[tokio::test]
	async fn test_buy_applies_slippage_to_cost() {
		let sampler = with_curve(CurveSampler::new(), Source::Uniswap, vec![dec!(0.5)]);
		let orders = vec![native_order(1, U256::ZERO, ether())];
		let options = PlanOptions {
			bridge_slippage: dec!(0.01),
			..options()
		};

		let result = router(sampler, None)
			.plan_buy(&orders, ether(), &options)
			.await
			.unwrap();

		let order = &result.optimized_orders[0];
		assert_eq!(order.source, Source::Uniswap);
		assert_eq!(order.maker_amount, ether());
		assert_eq!(order.output_amount, units(2_000_000_000_000_000_000));
		assert_eq!(order.taker_amount, units(2_020_000_000_000_000_000));
	}

	#[tokio::test]
	async fn test_two_hop_route_is_one_order() {
		let middle = Address::repeat_byte(0x77);
		let sampler = with_curve(CurveSampler::new(), Source::Uniswap, vec![dec!(1)])
			.with_curve(Source::Eth2Dai, vec![dec!(0.1)], FillData::Empty)
			.with_two_hop(TwoHopRoute {
				intermediate_token: middle,
				first_source: Source::Uniswap,
				first_rate: dec!(2),
				second_source: Source::Eth2Dai,
				second_rate: dec!(0.6),
			});
		let orders = vec![native_order(1, U256::ZERO, ether())];
		let options = PlanOptions {
			intermediate_tokens: vec![middle],
			..options()
		};

		let result = router(sampler, None)
			.plan_sell(&orders, ether(), &options)
			.await
			.unwrap();

		assert_eq!(sources_of(&result), vec![Source::MultiHop]);
		assert_eq!(
			result.optimized_orders[0].output_amount,
			units(1_200_000_000_000_000_000)
		);
		assert!(result.report.sources_queried.contains(&Source::MultiHop));
	}

	#[tokio::test]
	async fn test_order_validation() {
		let router = router(CurveSampler::new(), None);

		let result = router.plan_sell(&[], ether(), &options()).await;
		assert!(matches!(result, Err(RouterError::EmptyOrders)));

		let mut other = native_order(2, ether(), ether());
		other.maker_token = Address::repeat_byte(9);
		let orders = vec![native_order(1, ether(), ether()), other];
		let result = router.plan_sell(&orders, ether(), &options()).await;
		assert!(matches!(result, Err(RouterError::MismatchedOrders)));

		let orders = vec![native_order(1, ether(), ether())];
		let result = router.plan_sell(&orders, U256::ZERO, &options()).await;
		assert!(matches!(result, Err(RouterError::InvalidOptions(_))));
	}
}
