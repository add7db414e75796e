use std::sync::Arc;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use tracing::instrument;

use crate::{
    client::DexClient, consts::PAIR_KEY_SEPARATOR, errors::SdkError, swap::Swapper,
    units::format_amount,
};

#[async_trait]
pub trait Balance {
    /// Balance of the active wallet in the token's smallest unit.
    async fn balance_raw(&self) -> Result<U256, SdkError>;

    /// Balance of the active wallet, formatted with 18 decimals.
    async fn balance(&self) -> Result<f64, SdkError> {
        format_amount(self.balance_raw().await?)
    }
}

#[async_trait]
pub trait Priceable {
    /// On-chain `(reserve0, reserve1)`.
    async fn reserves(&self) -> Result<(u128, u128), SdkError>;

    /// On-chain `(token0, token1)`, ordered by address rather than by the pair key.
    async fn tokens(&self) -> Result<(Address, Address), SdkError>;

    /// `reserve1 / reserve0`, the amount of `token1` per `token0`.
    ///
    /// Both tokens are assumed to use 18 decimals, the result is wrong for pairs
    /// where they differ.
    async fn price(&self) -> Result<f64, SdkError>;
}

#[async_trait]
pub trait Tradeable {
    type PendingTx;

    /// Spends `amount` of the quote token (the full quote balance when `None`) on the base token.
    async fn buy(&self, amount: Option<&str>) -> Result<Self::PendingTx, SdkError>;

    /// Spends `amount` of the base token (the full base balance when `None`) on the quote token.
    async fn sell(&self, amount: Option<&str>) -> Result<Self::PendingTx, SdkError>;
}

#[derive(Debug)]
pub struct TokenHandle<C> {
    pub symbol: String,
    pub address: Address,
    client: Arc<C>,
}

impl<C> TokenHandle<C> {
    pub fn new(symbol: impl Into<String>, address: Address, client: Arc<C>) -> Self {
        Self {
            symbol: symbol.into(),
            address,
            client,
        }
    }
}

impl<C> Clone for TokenHandle<C> {
    fn clone(&self) -> Self {
        Self {
            symbol: self.symbol.clone(),
            address: self.address,
            client: self.client.clone(),
        }
    }
}

#[async_trait]
impl<C: DexClient> Balance for TokenHandle<C> {
    async fn balance_raw(&self) -> Result<U256, SdkError> {
        self.client
            .balance_of(self.address, self.client.wallet())
            .await
    }
}

#[derive(Debug)]
pub struct FactoryHandle<C> {
    pub address: Address,
    client: Arc<C>,
}

impl<C: DexClient> FactoryHandle<C> {
    pub fn new(address: Address, client: Arc<C>) -> Self {
        Self { address, client }
    }

    /// Pool address for the two tokens, the zero address if none was created.
    pub async fn get_pair(&self, token_a: Address, token_b: Address) -> Result<Address, SdkError> {
        self.client.get_pair(self.address, token_a, token_b).await
    }
}

#[derive(Debug)]
pub struct RouterHandle<C> {
    pub address: Address,
    client: Arc<C>,
}

impl<C: DexClient> RouterHandle<C> {
    pub fn new(address: Address, client: Arc<C>) -> Self {
        Self { address, client }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub async fn get_amounts_out(
        &self,
        amount_in: U256,
        path: &[Address],
    ) -> Result<Vec<U256>, SdkError> {
        self.client
            .get_amounts_out(self.address, amount_in, path)
            .await
    }
}

/// A discovered liquidity pool, keyed `BASE_QUOTE` within its exchange.
#[derive(Debug)]
pub struct PairHandle<C> {
    pub key: String,
    pub address: Address,
    /// `[base, quote]`, the key split on `_`.
    pub pairs: [String; 2],
    swapper: Arc<Swapper<C>>,
}

impl<C: DexClient> PairHandle<C> {
    pub fn new(
        key: impl Into<String>,
        address: Address,
        swapper: Arc<Swapper<C>>,
    ) -> Result<Self, SdkError> {
        let key = key.into();
        let (base, quote) =
            split_pair_key(&key).ok_or_else(|| SdkError::UnknownPair(key.clone()))?;
        let pairs = [base.to_string(), quote.to_string()];

        Ok(Self {
            key,
            address,
            pairs,
            swapper,
        })
    }

    pub fn base(&self) -> &str {
        &self.pairs[0]
    }

    pub fn quote(&self) -> &str {
        &self.pairs[1]
    }

    // A missing or zero amount spends the whole balance, read at call time
    async fn spend_amount(&self, symbol: &str, amount: Option<&str>) -> Result<U256, SdkError> {
        if let Some(amount) = amount {
            let amount = crate::units::parse_amount(amount)?;
            if !amount.is_zero() {
                return Ok(amount);
            }
        }

        let client = self.swapper.client();
        client
            .balance_of(self.swapper.token_address(symbol)?, client.wallet())
            .await
    }
}

#[async_trait]
impl<C: DexClient> Priceable for PairHandle<C> {
    async fn reserves(&self) -> Result<(u128, u128), SdkError> {
        self.swapper.client().get_reserves(self.address).await
    }

    async fn tokens(&self) -> Result<(Address, Address), SdkError> {
        self.swapper.client().pair_tokens(self.address).await
    }

    async fn price(&self) -> Result<f64, SdkError> {
        let (reserve_0, reserve_1) = self.reserves().await?;
        price_from_reserves(self.address, reserve_0, reserve_1)
    }
}

#[async_trait]
impl<C: DexClient> Tradeable for PairHandle<C> {
    type PendingTx = C::PendingTx;

    #[instrument(skip(self), fields(pair = %self.key), level = "debug")]
    async fn buy(&self, amount: Option<&str>) -> Result<C::PendingTx, SdkError> {
        let amount_in = self.spend_amount(self.quote(), amount).await?;
        self.swapper
            .swap_exact(amount_in, self.quote(), self.base(), None)
            .await
    }

    #[instrument(skip(self), fields(pair = %self.key), level = "debug")]
    async fn sell(&self, amount: Option<&str>) -> Result<C::PendingTx, SdkError> {
        let amount_in = self.spend_amount(self.base(), amount).await?;
        self.swapper
            .swap_exact(amount_in, self.base(), self.quote(), None)
            .await
    }
}

pub fn pair_key(base: &str, quote: &str) -> String {
    format!("{base}{PAIR_KEY_SEPARATOR}{quote}")
}

pub fn split_pair_key(key: &str) -> Option<(&str, &str)> {
    let (base, quote) = key.split_once(PAIR_KEY_SEPARATOR)?;
    if base.is_empty() || quote.is_empty() || quote.contains(PAIR_KEY_SEPARATOR) {
        return None;
    }
    Some((base, quote))
}

pub fn price_from_reserves(pair: Address, reserve_0: u128, reserve_1: u128) -> Result<f64, SdkError> {
    if reserve_0 == 0 {
        return Err(SdkError::EmptyReserves(pair));
    }
    Ok(reserve_1 as f64 / reserve_0 as f64)
}
