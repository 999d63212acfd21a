//! Liquidity sampling boundary for the market router.
//!
//! This module defines the [`Sampler`] collaborator that supplies price
//! curves, native order fillable amounts and reference rates, and the
//! [`SamplerService`] that fans requests out per source and contains
//! individual source failures as empty results.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use futures::future::join_all;
use router_types::{DexSample, MarketSide, NativeOrder, Source, TokenPair};
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub mod amounts;

/// Re-export implementations
pub mod implementations {
	pub mod curve;
}

pub use amounts::get_sample_amounts;

/// Errors a sampler can report for a single request.
#[derive(Debug, Error)]
pub enum SamplerError {
	/// The on-chain sampling call reverted.
	#[error("Sampling reverted for {0}")]
	Reverted(Source),
	/// The source is not supported for the requested side.
	#[error("Source {0} cannot be sampled for {1}")]
	Unsupported(Source, MarketSide),
	/// The request did not complete in time.
	#[error("Sampling timed out after {0:?}")]
	Timeout(Duration),
	/// Transport or provider failure.
	#[error("Provider error: {0}")]
	Provider(String),
}

/// Parameters of a per-source quote request.
#[derive(Debug, Clone)]
pub struct QuoteRequest {
	pub source: Source,
	pub pair: TokenPair,
	/// Cumulative input amounts to sample at, ascending.
	pub amounts: Vec<U256>,
	/// Registry used to resolve the ad-hoc liquidity provider, when enabled.
	pub liquidity_provider_registry: Option<Address>,
}

/// Parameters of a two-hop quote request.
#[derive(Debug, Clone)]
pub struct TwoHopRequest {
	/// Sources allowed for either leg.
	pub sources: Vec<Source>,
	pub pair: TokenPair,
	pub intermediate_token: Address,
	/// Full input amount; two-hop routes are sampled at a single point.
	pub amount: U256,
	pub liquidity_provider_registry: Option<Address>,
}

/// Trait defining the sampling collaborator.
///
/// Implementations issue the actual price and fillable-amount queries.
/// Curve math, pool discovery and caching all live behind this trait; a
/// stale or empty cache should surface as empty sample sets.
#[async_trait]
pub trait Sampler: Send + Sync {
	/// Remaining fillable taker amount of each order, in order.
	async fn get_order_fillable_taker_amounts(
		&self,
		orders: &[NativeOrder],
	) -> Result<Vec<U256>, SamplerError>;

	/// Remaining fillable maker amount of each order, in order.
	async fn get_order_fillable_maker_amounts(
		&self,
		orders: &[NativeOrder],
	) -> Result<Vec<U256>, SamplerError>;

	/// Cumulative sell samples for one source: input is taker asset sold.
	async fn get_sell_quotes(&self, request: &QuoteRequest) -> Result<Vec<DexSample>, SamplerError>;

	/// Cumulative buy samples for one source: input is maker asset bought.
	async fn get_buy_quotes(&self, request: &QuoteRequest) -> Result<Vec<DexSample>, SamplerError>;

	/// Median rate (maker units per taker unit) across `sources` when
	/// selling `amount` of the pair's taker token.
	async fn get_median_rate(
		&self,
		sources: &[Source],
		pair: TokenPair,
		amount: U256,
	) -> Result<Decimal, SamplerError>;

	/// Samples for two-leg routes. An empty result means no route exists.
	async fn get_two_hop_quotes(
		&self,
		side: MarketSide,
		request: &TwoHopRequest,
	) -> Result<Vec<DexSample>, SamplerError>;
}

/// Samples returned for one source.
#[derive(Debug, Clone)]
pub struct SourceSamples {
	pub source: Source,
	pub samples: Vec<DexSample>,
}

/// Service that batches sampler calls and contains per-source failures.
///
/// Every member of a batch is awaited; a member that fails or exceeds the
/// timeout contributes an empty result instead of failing the batch.
#[derive(Clone)]
pub struct SamplerService {
	sampler: Arc<dyn Sampler>,
	timeout: Option<Duration>,
}

impl SamplerService {
	pub fn new(sampler: Arc<dyn Sampler>) -> Self {
		Self {
			sampler,
			timeout: None,
		}
	}

	/// Bounds each individual sampler call.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);
		self
	}

	/// Samples every source concurrently, returning results in the order of
	/// `sources`.
	pub async fn sample_quotes(
		&self,
		side: MarketSide,
		sources: &[Source],
		pair: TokenPair,
		amounts: &[U256],
		liquidity_provider_registry: Option<Address>,
	) -> Vec<SourceSamples> {
		let requests = sources.iter().map(|source| QuoteRequest {
			source: *source,
			pair,
			amounts: amounts.to_vec(),
			liquidity_provider_registry,
		});

		let batch = requests.map(|request| async move {
			let source = request.source;
			let samples = self
				.contain(source.name(), async {
					match side {
						MarketSide::Sell => self.sampler.get_sell_quotes(&request).await,
						MarketSide::Buy => self.sampler.get_buy_quotes(&request).await,
					}
				})
				.await
				.unwrap_or_default();
			debug!(%source, samples = samples.len(), "Sampled source");
			SourceSamples { source, samples }
		});

		join_all(batch).await
	}

	/// Fillable amounts for native orders, in input units of `side`.
	///
	/// A failed or malformed response yields zero for every order.
	pub async fn fillable_amounts(&self, side: MarketSide, orders: &[NativeOrder]) -> Vec<U256> {
		if orders.is_empty() {
			return Vec::new();
		}
		let amounts = self
			.contain("native", async {
				match side {
					MarketSide::Sell => self.sampler.get_order_fillable_taker_amounts(orders).await,
					MarketSide::Buy => self.sampler.get_order_fillable_maker_amounts(orders).await,
				}
			})
			.await;

		match amounts {
			Some(amounts) if amounts.len() == orders.len() => amounts,
			Some(amounts) => {
				warn!(
					expected = orders.len(),
					actual = amounts.len(),
					"Fillable amount count mismatch, treating native orders as unfillable"
				);
				vec![U256::ZERO; orders.len()]
			}
			None => vec![U256::ZERO; orders.len()],
		}
	}

	/// Rate converting fee units into units of `output_token`.
	///
	/// Returns one when the output token is the fee token itself, and zero
	/// when the rate cannot be sampled, which disables fee weighting.
	pub async fn reference_rate(
		&self,
		sources: &[Source],
		output_token: Address,
		fee_token: Address,
		fee_token_unit: U256,
	) -> Decimal {
		if output_token == fee_token {
			return Decimal::ONE;
		}
		let pair = TokenPair::new(output_token, fee_token);
		self.contain("reference-rate", async {
			self.sampler
				.get_median_rate(sources, pair, fee_token_unit)
				.await
		})
		.await
		.unwrap_or(Decimal::ZERO)
	}

	/// Two-hop samples through each intermediate token, concatenated.
	pub async fn two_hop_quotes(
		&self,
		side: MarketSide,
		sources: &[Source],
		pair: TokenPair,
		intermediate_tokens: &[Address],
		amount: U256,
		liquidity_provider_registry: Option<Address>,
	) -> Vec<DexSample> {
		let batch = intermediate_tokens
			.iter()
			.filter(|token| **token != pair.maker_token && **token != pair.taker_token)
			.map(|token| {
				let request = TwoHopRequest {
					sources: sources.to_vec(),
					pair,
					intermediate_token: *token,
					amount,
					liquidity_provider_registry,
				};
				async move {
					self.contain("two-hop", async {
						self.sampler.get_two_hop_quotes(side, &request).await
					})
					.await
					.unwrap_or_default()
				}
			});

		join_all(batch).await.into_iter().flatten().collect()
	}

	/// Awaits a sampler call, logging and swallowing its failure.
	async fn contain<T, F>(&self, label: &str, call: F) -> Option<T>
	where
		F: Future<Output = Result<T, SamplerError>>,
	{
		let result = match self.timeout {
			Some(timeout) => match tokio::time::timeout(timeout, call).await {
				Ok(result) => result,
				Err(_) => Err(SamplerError::Timeout(timeout)),
			},
			None => call.await,
		};

		match result {
			Ok(value) => Some(value),
			Err(e) => {
				warn!(source = label, error = %e, "Sampling failed, treating as no liquidity");
				None
			}
		}
	}
}
