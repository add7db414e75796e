use alloy::primitives::{address, Address, U256};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_RPC_URL: &str = "https://bsc-dataseed.binance.org/";

// Default quote tokens every exchange is paired against
pub const BUSD: Address = address!("e9e7cea3dedca5984780bafc599bd69add087d56");
pub const WBNB: Address = address!("bb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c");
pub const BUSD_SYMBOL: &str = "BUSD";
pub const WBNB_SYMBOL: &str = "WBNB";

/// Separator between the base and quote symbol of a pair key.
pub const PAIR_KEY_SEPARATOR: char = '_';

// Every token is treated as an 18 decimals token
pub const TOKEN_DECIMALS: u8 = 18;

pub const DEFAULT_SLIPPAGE_PERCENT: f64 = 0.5;
pub const DEFAULT_GAS_LIMIT: u64 = 150_000;
pub const GAS_PRICE_WEI: u128 = 5_000_000_000; // 5 gwei
pub const SWAP_DEADLINE_SECS: u64 = 60 * 10;

// Slippage is applied in parts per million of the quoted amount
pub const SLIPPAGE_SCALE: u64 = 1_000_000;
pub const U256_SLIPPAGE_SCALE: U256 = U256::from_limbs([SLIPPAGE_SCALE, 0, 0, 0]);

pub const LINE_NOTIFY_URL: &str = "https://notify-api.line.me/api/notify";
