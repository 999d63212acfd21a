//! Serde helpers for configuration deserialization

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use router_types::Source;
use std::collections::BTreeMap;

/// Custom deserializer for BTreeMap<Source, T> that accepts source names as keys
pub fn deserialize_source_map<'de, D, T>(deserializer: D) -> Result<BTreeMap<Source, T>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	let map = BTreeMap::<String, T>::deserialize(deserializer)?;

	map.into_iter()
		.map(|(k, v)| {
			k.parse::<Source>()
				.map(|source| (source, v))
				.map_err(serde::de::Error::custom)
		})
		.collect()
}

/// Custom serializer for BTreeMap<Source, T> that writes source names as keys
pub fn serialize_source_map<S, T>(map: &BTreeMap<Source, T>, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
	T: Serialize,
{
	let string_map: BTreeMap<&str, &T> = map.iter().map(|(k, v)| (k.name(), v)).collect();

	string_map.serialize(serializer)
}

/// Custom deserializer for a list of sources given by name
pub fn deserialize_source_list<'de, D>(deserializer: D) -> Result<Vec<Source>, D::Error>
where
	D: Deserializer<'de>,
{
	let names = Vec::<String>::deserialize(deserializer)?;

	names
		.iter()
		.map(|name| name.parse::<Source>().map_err(serde::de::Error::custom))
		.collect()
}

/// Serde support for U256 values written as decimal strings
pub mod u256_decimal {
	use alloy_primitives::U256;
	use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

	pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		value.to_string().serialize(serializer)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		U256::from_str_radix(&s, 10).map_err(D::Error::custom)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde::Deserialize;

	#[derive(Debug, Deserialize, Serialize)]
	struct TestStruct {
		#[serde(default, deserialize_with = "deserialize_source_list")]
		excluded: Vec<Source>,
		#[serde(
			deserialize_with = "deserialize_source_map",
			serialize_with = "serialize_source_map"
		)]
		gas: BTreeMap<Source, u64>,
	}

	#[test]
	fn test_deserialize_source_map() {
		let toml = r#"
            excluded = ["kyber", "Uniswap_V2"]

            [gas]
            Uniswap = 90000
            Curve = 600000
        "#;

		let result: TestStruct = toml::from_str(toml).unwrap();
		assert_eq!(result.gas.get(&Source::Uniswap), Some(&90000));
		assert_eq!(result.gas.get(&Source::Curve), Some(&600000));
		assert_eq!(result.excluded, vec![Source::Kyber, Source::UniswapV2]);
	}

	#[test]
	fn test_unknown_source_is_rejected() {
		let toml = r#"
            [gas]
            Binance = 1
        "#;

		let result: Result<TestStruct, _> = toml::from_str(toml);
		assert!(result.is_err());
	}

	#[test]
	fn test_serialize_source_map() {
		let mut gas = BTreeMap::new();
		gas.insert(Source::UniswapV2, 150000u64);

		let test_struct = TestStruct {
			excluded: vec![],
			gas,
		};

		let toml = toml::to_string(&test_struct).unwrap();
		assert!(toml.contains("Uniswap_V2 = 150000"));

		let parsed: TestStruct = toml::from_str(&toml).unwrap();
		assert_eq!(parsed.gas.get(&Source::UniswapV2), Some(&150000));
	}

	#[derive(Debug, Deserialize, Serialize)]
	struct Price {
		#[serde(with = "u256_decimal")]
		gas_price: alloy_primitives::U256,
	}

	#[test]
	fn test_u256_decimal_round_trip() {
		let parsed: Price = toml::from_str(r#"gas_price = "100000000000000000000000000000""#).unwrap();
		assert_eq!(
			parsed.gas_price,
			alloy_primitives::U256::from(10).pow(alloy_primitives::U256::from(29))
		);
		assert!(toml::to_string(&parsed)
			.unwrap()
			.contains(r#""100000000000000000000000000000""#));

		let result: Result<Price, _> = toml::from_str(r#"gas_price = "0x10""#);
		assert!(result.is_err());
	}
}
