use std::{collections::BTreeMap, fs, path::Path};

use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{consts::PAIR_KEY_SEPARATOR, errors::ConfigError};

/// Declarative table of the tokens and exchanges a session binds to.
///
/// The JSON layout is
/// `{ "Tokens": { sym: addr }, "AMM": { name: { "Factory", "Router", "stables"? } } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "Tokens")]
    pub tokens: BTreeMap<String, Address>,
    #[serde(rename = "AMM")]
    pub amm: BTreeMap<String, ExchangeConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    #[serde(rename = "Factory")]
    pub factory: Address,
    #[serde(rename = "Router")]
    pub router: Address,
    /// Extra quote tokens this exchange is paired against, ahead of BUSD and WBNB.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stables: BTreeMap<String, Address>,
}

impl Config {
    pub fn new(
        tokens: BTreeMap<String, Address>,
        amm: BTreeMap<String, ExchangeConfig>,
    ) -> Result<Self, ConfigError> {
        let config = Self { tokens, amm };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[instrument(level = "debug")]
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// PancakeSwap on BNB Smart Chain with a handful of liquid tokens.
    pub fn bsc() -> Self {
        let tokens = [
            ("BTCB", address!("7130d2a12b9bcbfae4f2634d864a1ee1ce3ead9c")),
            ("BUSD", address!("e9e7cea3dedca5984780bafc599bd69add087d56")),
            ("CAKE", address!("0e09fabb73bd3ade0a17ecc321fd13a19e81ce82")),
            ("ETH", address!("2170ed0880ac9a755fd29b2688956bd959f933f8")),
            ("WBNB", address!("bb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c")),
        ]
        .into_iter()
        .map(|(symbol, address)| (symbol.to_string(), address))
        .collect();

        let amm = [(
            "PancakeSwap".to_string(),
            ExchangeConfig {
                factory: address!("ca143ce32fe78f1f7019d7d551a6402fc5350c73"),
                router: address!("10ed43c718714eb63d5aa57b78b54704e256024e"),
                stables: [(
                    "USDT".to_string(),
                    address!("55d398326f99059ff775485246999027b3197955"),
                )]
                .into_iter()
                .collect(),
            },
        )]
        .into_iter()
        .collect();

        Self { tokens, amm }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tokens.is_empty() {
            return Err(ConfigError::NoTokens);
        }

        for (symbol, address) in &self.tokens {
            validate_symbol(symbol)?;
            if address.is_zero() {
                return Err(ConfigError::ZeroTokenAddress(symbol.clone()));
            }
        }

        for (name, exchange) in &self.amm {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidExchangeName(name.clone()));
            }
            if exchange.factory.is_zero() {
                return Err(ConfigError::ZeroContractAddress {
                    exchange: name.clone(),
                    contract: "Factory",
                });
            }
            if exchange.router.is_zero() {
                return Err(ConfigError::ZeroContractAddress {
                    exchange: name.clone(),
                    contract: "Router",
                });
            }
            for (symbol, address) in &exchange.stables {
                validate_symbol(symbol)?;
                if address.is_zero() {
                    return Err(ConfigError::ZeroTokenAddress(symbol.clone()));
                }
            }
        }

        Ok(())
    }
}

// Pair keys are split on '_', a symbol containing it would produce a wrong pair
fn validate_symbol(symbol: &str) -> Result<(), ConfigError> {
    if symbol.is_empty() || symbol.contains(PAIR_KEY_SEPARATOR) {
        return Err(ConfigError::InvalidSymbol(symbol.to_string()));
    }
    Ok(())
}
