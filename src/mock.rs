//! In-memory [`DexClient`] used by the unit tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use alloy::primitives::{address, Address, TxHash, U256};
use async_trait::async_trait;

use crate::{
    client::DexClient,
    errors::SdkError,
    swap::{GasSettings, SwapRequest},
};

pub const ALICE: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
pub const CAKE: Address = address!("0e09fabb73bd3ade0a17ecc321fd13a19e81ce82");
pub const ETH: Address = address!("2170ed0880ac9a755fd29b2688956bd959f933f8");
pub const USDT: Address = address!("55d398326f99059ff775485246999027b3197955");
pub const FACTORY: Address = address!("ca143ce32fe78f1f7019d7d551a6402fc5350c73");
pub const ROUTER: Address = address!("10ed43c718714eb63d5aa57b78b54704e256024e");
pub const FACTORY_B: Address = address!("858e3312ed3a876947ea49d572a7c42de08af7ee");
pub const ROUTER_B: Address = address!("3a6d8ca21d1cf76f653a67577fa0d27453350dd8");

pub type PairLookup = (Address, Address, Address);

#[derive(Debug, Default)]
pub struct MockDexClient {
    wallet: Address,
    pairs: HashMap<PairLookup, Address>,
    pair_tokens: HashMap<Address, (Address, Address)>,
    reserves: HashMap<Address, (u128, u128)>,
    balances: Mutex<HashMap<(Address, Address), U256>>,
    native_balance: U256,
    fixed_quote: Option<U256>,
    fail_quotes: bool,
    fail_gas_estimate: bool,
    fail_pair_lookups: bool,
    pair_lookups: Mutex<Vec<PairLookup>>,
    quote_calls: AtomicUsize,
    balance_calls: AtomicUsize,
    sent: Mutex<Vec<(Address, SwapRequest, GasSettings)>>,
}

impl MockDexClient {
    pub const ESTIMATED_GAS: u64 = 123_456;

    pub fn new(wallet: Address) -> Self {
        Self {
            wallet,
            ..Default::default()
        }
    }

    /// Registers a pool for the unordered token pair on `factory`.
    pub fn with_pair(mut self, factory: Address, token_a: Address, token_b: Address, pair: Address) -> Self {
        self.pairs.insert((factory, token_a, token_b), pair);
        self.pairs.insert((factory, token_b, token_a), pair);
        // Factories sort the pair's tokens by address
        let tokens = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        self.pair_tokens.insert(pair, tokens);
        self
    }

    pub fn with_reserves(mut self, pair: Address, reserve_0: u128, reserve_1: u128) -> Self {
        self.reserves.insert(pair, (reserve_0, reserve_1));
        self
    }

    pub fn with_native_balance(mut self, balance: U256) -> Self {
        self.native_balance = balance;
        self
    }

    pub fn with_fixed_quote(mut self, amount_out: U256) -> Self {
        self.fixed_quote = Some(amount_out);
        self
    }

    pub fn with_failing_quotes(mut self) -> Self {
        self.fail_quotes = true;
        self
    }

    pub fn with_failing_gas_estimate(mut self) -> Self {
        self.fail_gas_estimate = true;
        self
    }

    pub fn with_failing_pair_lookups(mut self) -> Self {
        self.fail_pair_lookups = true;
        self
    }

    pub fn set_balance(&self, token: Address, owner: Address, balance: U256) {
        self.balances
            .lock()
            .unwrap()
            .insert((token, owner), balance);
    }

    pub fn pair_lookups(&self) -> Vec<PairLookup> {
        self.pair_lookups.lock().unwrap().clone()
    }

    pub fn sent_swaps(&self) -> Vec<(Address, SwapRequest, GasSettings)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn quote_calls(&self) -> usize {
        self.quote_calls.load(Ordering::SeqCst)
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    fn rpc_error(message: &str) -> SdkError {
        SdkError::TransportError(alloy::transports::TransportErrorKind::custom_str(message))
    }
}

#[async_trait]
impl DexClient for MockDexClient {
    type PendingTx = TxHash;

    fn wallet(&self) -> Address {
        self.wallet
    }

    async fn native_balance(&self, _owner: Address) -> Result<U256, SdkError> {
        Ok(self.native_balance)
    }

    async fn get_pair(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Address, SdkError> {
        self.pair_lookups
            .lock()
            .unwrap()
            .push((factory, token_a, token_b));

        if self.fail_pair_lookups {
            return Err(Self::rpc_error("getPair reverted"));
        }

        Ok(self
            .pairs
            .get(&(factory, token_a, token_b))
            .copied()
            .unwrap_or_default())
    }

    async fn get_reserves(&self, pair: Address) -> Result<(u128, u128), SdkError> {
        self.reserves
            .get(&pair)
            .copied()
            .ok_or_else(|| Self::rpc_error("no reserves"))
    }

    async fn pair_tokens(&self, pair: Address) -> Result<(Address, Address), SdkError> {
        self.pair_tokens
            .get(&pair)
            .copied()
            .ok_or_else(|| Self::rpc_error("not a pair"))
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, SdkError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(&(token, owner))
            .copied()
            .unwrap_or_default())
    }

    async fn get_amounts_out(
        &self,
        _router: Address,
        amount_in: U256,
        path: &[Address],
    ) -> Result<Vec<U256>, SdkError> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_quotes {
            return Err(Self::rpc_error("getAmountsOut reverted"));
        }

        let mut amounts = vec![amount_in; path.len()];
        if let (Some(last), Some(quote)) = (amounts.last_mut(), self.fixed_quote) {
            *last = quote;
        }
        Ok(amounts)
    }

    async fn estimate_swap_gas(
        &self,
        _router: Address,
        _swap: &SwapRequest,
    ) -> Result<u64, SdkError> {
        if self.fail_gas_estimate {
            return Err(Self::rpc_error("execution reverted"));
        }
        Ok(Self::ESTIMATED_GAS)
    }

    async fn send_swap(
        &self,
        router: Address,
        swap: &SwapRequest,
        gas: GasSettings,
    ) -> Result<TxHash, SdkError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push((router, swap.clone(), gas));
        Ok(TxHash::with_last_byte(sent.len() as u8))
    }
}
