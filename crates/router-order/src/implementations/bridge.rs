//! Bridge call encoding keyed by a static venue address book.
//!
//! Each venue is reached through a bridge contract that receives the ABI
//! encoded fill payload. Two-hop orders are routed through the multi-hop
//! bridge, which carries the call data of both legs.

use crate::{OrderEncoder, OrderError};
use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{sol, SolValue};
use router_types::{EncodedBridgeCall, FillData, FillDataKind, HopFill, Source, TokenPair};
use std::collections::BTreeMap;

// Bridge data layouts understood by the venue bridges.
sol! {
	/// Venues that only need the token being sold.
	struct TokenBridgeData {
		address fromToken;
	}

	/// Router venues trading along a token path.
	struct PathBridgeData {
		address[] path;
	}

	struct CurveBridgeData {
		address pool;
		bytes4 exchangeSelector;
		int128 fromTokenIdx;
		int128 toTokenIdx;
	}

	/// Venues addressed by a single pool.
	struct PoolBridgeData {
		address fromToken;
		address pool;
	}

	struct BancorBridgeData {
		address[] path;
		address network;
	}

	struct DodoBridgeData {
		address fromToken;
		address pool;
		address helper;
		bool isSellBase;
	}

	/// Both legs of a two-hop route.
	struct MultiHopBridgeData {
		address intermediateToken;
		address firstBridge;
		bytes firstData;
		address secondBridge;
		bytes secondData;
	}
}

/// Encoder resolving each source to its bridge contract.
pub struct BridgeAddressEncoder {
	bridges: BTreeMap<Source, Address>,
}

impl BridgeAddressEncoder {
	pub fn new(bridges: BTreeMap<Source, Address>) -> Self {
		Self { bridges }
	}

	fn bridge(&self, source: Source) -> Result<Address, OrderError> {
		self.bridges
			.get(&source)
			.copied()
			.ok_or(OrderError::UnknownBridge(source))
	}

	fn encode_leg(&self, leg: &HopFill, pair: TokenPair) -> Result<EncodedBridgeCall, OrderError> {
		if leg.source == Source::MultiHop {
			return Err(OrderError::UnsupportedFillData(
				leg.source,
				leg.fill_data.kind(),
			));
		}
		self.encode(leg.source, &leg.fill_data, pair)
	}
}

impl OrderEncoder for BridgeAddressEncoder {
	fn encode(
		&self,
		source: Source,
		fill_data: &FillData,
		pair: TokenPair,
	) -> Result<EncodedBridgeCall, OrderError> {
		if !FillDataKind::for_source(source).matches(fill_data) {
			return Err(OrderError::UnsupportedFillData(source, fill_data.kind()));
		}
		let target = self.bridge(source)?;
		let from_token = pair.taker_token;

		let payload = match fill_data {
			FillData::Empty => TokenBridgeData {
				fromToken: from_token,
			}
			.abi_encode(),
			FillData::TokenPath { token_address_path } => PathBridgeData {
				path: token_address_path.clone(),
			}
			.abi_encode(),
			FillData::Curve(info) => CurveBridgeData {
				pool: info.pool_address,
				exchangeSelector: info.exchange_selector,
				fromTokenIdx: i128::from(info.from_token_index),
				toTokenIdx: i128::from(info.to_token_index),
			}
			.abi_encode(),
			FillData::Pool { pool_address } => PoolBridgeData {
				fromToken: from_token,
				pool: *pool_address,
			}
			.abi_encode(),
			FillData::Bancor {
				network_address,
				path,
			} => BancorBridgeData {
				path: path.clone(),
				network: *network_address,
			}
			.abi_encode(),
			FillData::Dodo {
				pool_address,
				helper_address,
				is_sell_base,
			} => DodoBridgeData {
				fromToken: from_token,
				pool: *pool_address,
				helper: *helper_address,
				isSellBase: *is_sell_base,
			}
			.abi_encode(),
			FillData::MultiHop {
				intermediate_token,
				first_hop,
				second_hop,
			} => {
				let first = self.encode_leg(
					first_hop,
					TokenPair::new(*intermediate_token, pair.taker_token),
				)?;
				let second = self.encode_leg(
					second_hop,
					TokenPair::new(pair.maker_token, *intermediate_token),
				)?;
				MultiHopBridgeData {
					intermediateToken: *intermediate_token,
					firstBridge: first.target,
					firstData: first.payload,
					secondBridge: second.target,
					secondData: second.payload,
				}
				.abi_encode()
			}
			// Native orders are never bridged.
			FillData::Native(_) => {
				return Err(OrderError::UnsupportedFillData(source, FillDataKind::Native))
			}
		};

		Ok(EncodedBridgeCall {
			target,
			payload: Bytes::from(payload),
		})
	}
}
