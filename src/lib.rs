#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod client;
pub mod config;
pub mod consts;
pub mod contracts;
pub mod errors;
pub mod handles;
#[cfg(test)]
mod mock;
pub mod notify;
pub mod registry;
pub mod sdk;
pub mod swap;
pub mod units;

pub use client::{AlloyClient, DexClient};
pub use config::{Config, ExchangeConfig};
pub use errors::SdkError;
pub use handles::{Balance, Priceable, Tradeable};
pub use registry::Registry;
pub use sdk::DefiSdk;
