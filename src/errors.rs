use alloy::{
    primitives::{utils::UnitsError, Address},
    signers::local::LocalSignerError,
    transports::TransportError,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Transport error")]
    TransportError(#[from] TransportError),
    #[error("Contract error")]
    ContractError(#[from] alloy::contract::Error),
    #[error("Signer error")]
    SignerError(#[from] LocalSignerError),
    #[error("Units error")]
    UnitsError(#[from] UnitsError),
    #[error("Parse float error")]
    ParseFloatError(#[from] std::num::ParseFloatError),
    #[error("Negative amount {0}")]
    NegativeAmount(String),
    #[error("Invalid url")]
    InvalidUrl(#[from] url::ParseError),
    #[error(transparent)]
    ConfigError(#[from] ConfigError),
    #[error("Notification error")]
    NotifyError(#[from] reqwest::Error),
    #[error("Notification rejected with status {0}")]
    NotifyRejected(u16),
    #[error("Unknown token {0}")]
    UnknownToken(String),
    #[error("Unknown exchange {0}")]
    UnknownExchange(String),
    #[error("Unknown pair {0}")]
    UnknownPair(String),
    #[error("Slippage must be a percentage between 0 and 100, got {0}")]
    InvalidSlippage(f64),
    #[error("Router returned {0} amounts for a two token path")]
    MalformedQuote(usize),
    #[error("Pair {0} has no reserves")]
    EmptyReserves(Address),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read contract table")]
    Io(#[from] std::io::Error),
    #[error("Could not parse contract table")]
    Json(#[from] serde_json::Error),
    #[error("No tokens configured")]
    NoTokens,
    #[error("Invalid symbol {0:?}: symbols must be non-empty and must not contain '_'")]
    InvalidSymbol(String),
    #[error("Token {0} has the zero address")]
    ZeroTokenAddress(String),
    #[error("Exchange {exchange} has a zero {contract} address")]
    ZeroContractAddress {
        exchange: String,
        contract: &'static str,
    },
    #[error("Invalid exchange name {0:?}")]
    InvalidExchangeName(String),
    #[error("Invalid wallet secret: expected a 64 hex character private key or a mnemonic phrase")]
    InvalidWalletSecret,
}
