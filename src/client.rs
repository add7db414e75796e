use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{Address, U256},
    providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder},
    signers::local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner},
};
use async_trait::async_trait;
use tracing::{info, instrument};
use url::Url;

use crate::{
    consts::DEFAULT_RPC_URL,
    contracts::{IUniswapV2Factory, IUniswapV2Pair, IUniswapV2Router02, IERC20},
    errors::{ConfigError, SdkError},
    swap::{GasSettings, SwapRequest},
};

/// The calls the registry and the swap executor make against the chain.
///
/// Everything behind this trait (transport, ABI encoding, signing, gas estimation)
/// is delegated to the underlying client library.
#[async_trait]
pub trait DexClient: Send + Sync + 'static {
    /// Handle to a submitted, not yet confirmed transaction.
    type PendingTx: Send;

    /// Address of the active wallet. Swap output and balance queries are bound to it.
    fn wallet(&self) -> Address;

    async fn native_balance(&self, owner: Address) -> Result<U256, SdkError>;

    /// Factory `getPair`. Returns the zero address when no pool exists.
    async fn get_pair(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Address, SdkError>;

    /// Pair `getReserves` as `(reserve0, reserve1)`.
    async fn get_reserves(&self, pair: Address) -> Result<(u128, u128), SdkError>;

    /// Pair `token0` and `token1`, the owners of `reserve0` and `reserve1`.
    async fn pair_tokens(&self, pair: Address) -> Result<(Address, Address), SdkError>;

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, SdkError>;

    async fn get_amounts_out(
        &self,
        router: Address,
        amount_in: U256,
        path: &[Address],
    ) -> Result<Vec<U256>, SdkError>;

    async fn estimate_swap_gas(
        &self,
        router: Address,
        swap: &SwapRequest,
    ) -> Result<u64, SdkError>;

    async fn send_swap(
        &self,
        router: Address,
        swap: &SwapRequest,
        gas: GasSettings,
    ) -> Result<Self::PendingTx, SdkError>;
}

/// [`DexClient`] over an alloy HTTP provider signing with a local wallet.
#[derive(Debug, Clone)]
pub struct AlloyClient {
    provider: DynProvider,
    signer: PrivateKeySigner,
    rpc_url: Url,
}

impl AlloyClient {
    /// Connects to `rpc_url` (the public BSC endpoint when `None`) with a wallet
    /// built from a raw private key or a mnemonic phrase.
    pub fn new(rpc_url: Option<&str>, secret: &str) -> Result<Self, SdkError> {
        Self::with_signer(
            rpc_url.unwrap_or(DEFAULT_RPC_URL),
            signer_from_secret(secret)?,
        )
    }

    pub fn with_signer(rpc_url: &str, signer: PrivateKeySigner) -> Result<Self, SdkError> {
        let rpc_url: Url = rpc_url.parse()?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer.clone()))
            .connect_http(rpc_url.clone())
            .erased();

        Ok(Self {
            provider,
            signer,
            rpc_url,
        })
    }

    /// Same wallet, different endpoint.
    pub fn with_rpc_url(&self, rpc_url: &str) -> Result<Self, SdkError> {
        Self::with_signer(rpc_url, self.signer.clone())
    }

    /// Same endpoint, different wallet.
    pub fn with_wallet(&self, secret: &str) -> Result<Self, SdkError> {
        Self::with_signer(self.rpc_url.as_str(), signer_from_secret(secret)?)
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }
}

/// Builds a signer from either a 64 hex character private key (optionally `0x`
/// prefixed) or a BIP-39 mnemonic, using the first account of the default
/// derivation path for the latter.
pub fn signer_from_secret(secret: &str) -> Result<PrivateKeySigner, SdkError> {
    let secret = secret.trim();
    let key = secret.strip_prefix("0x").unwrap_or(secret);

    if key.len() == 64 && key.chars().all(|c| c.is_ascii_hexdigit()) {
        return Ok(key.parse::<PrivateKeySigner>()?);
    }

    if secret.split_whitespace().count() < 12 {
        return Err(ConfigError::InvalidWalletSecret.into());
    }

    Ok(MnemonicBuilder::<English>::default()
        .phrase(secret)
        .build()?)
}

#[async_trait]
impl DexClient for AlloyClient {
    type PendingTx = PendingTransactionBuilder<Ethereum>;

    fn wallet(&self) -> Address {
        self.signer.address()
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, SdkError> {
        Ok(self.provider.get_balance(owner).await?)
    }

    #[instrument(skip(self), level = "trace")]
    async fn get_pair(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Address, SdkError> {
        let factory = IUniswapV2Factory::new(factory, self.provider.clone());
        Ok(factory.getPair(token_a, token_b).call().await?)
    }

    #[instrument(skip(self), level = "trace")]
    async fn get_reserves(&self, pair: Address) -> Result<(u128, u128), SdkError> {
        let pair = IUniswapV2Pair::new(pair, self.provider.clone());
        let IUniswapV2Pair::getReservesReturn {
            reserve0, reserve1, ..
        } = pair.getReserves().call().await?;

        Ok((reserve0.to::<u128>(), reserve1.to::<u128>()))
    }

    #[instrument(skip(self), level = "trace")]
    async fn pair_tokens(&self, pair: Address) -> Result<(Address, Address), SdkError> {
        let pair = IUniswapV2Pair::new(pair, self.provider.clone());
        let token0 = pair.token0().call().await?;
        let token1 = pair.token1().call().await?;

        Ok((token0, token1))
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, SdkError> {
        let token = IERC20::new(token, self.provider.clone());
        Ok(token.balanceOf(owner).call().await?)
    }

    #[instrument(skip(self), level = "trace")]
    async fn get_amounts_out(
        &self,
        router: Address,
        amount_in: U256,
        path: &[Address],
    ) -> Result<Vec<U256>, SdkError> {
        let router = IUniswapV2Router02::new(router, self.provider.clone());
        Ok(router
            .getAmountsOut(amount_in, path.to_vec())
            .call()
            .await?)
    }

    async fn estimate_swap_gas(
        &self,
        router: Address,
        swap: &SwapRequest,
    ) -> Result<u64, SdkError> {
        let router = IUniswapV2Router02::new(router, self.provider.clone());
        Ok(router
            .swapExactTokensForTokens(
                swap.amount_in,
                swap.amount_out_min,
                swap.path.clone(),
                swap.to,
                swap.deadline,
            )
            .from(self.wallet())
            .estimate_gas()
            .await?)
    }

    #[instrument(skip(self, swap), fields(path = ?swap.path), level = "debug")]
    async fn send_swap(
        &self,
        router: Address,
        swap: &SwapRequest,
        gas: GasSettings,
    ) -> Result<Self::PendingTx, SdkError> {
        let router = IUniswapV2Router02::new(router, self.provider.clone());
        let pending = router
            .swapExactTokensForTokens(
                swap.amount_in,
                swap.amount_out_min,
                swap.path.clone(),
                swap.to,
                swap.deadline,
            )
            .from(self.wallet())
            .gas(gas.gas_limit)
            .gas_price(gas.gas_price)
            .send()
            .await?;

        info!(
            target = "defi_sdk::client",
            tx_hash = ?pending.tx_hash(),
            "Swap submitted"
        );

        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const ANVIL_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const ANVIL_MNEMONIC: &str = "test test test test test test test test test test test junk";
    const ANVIL_ADDRESS: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");

    #[test]
    fn test_signer_from_private_key() {
        let signer = signer_from_secret(ANVIL_KEY).unwrap();
        assert_eq!(signer.address(), ANVIL_ADDRESS);

        let prefixed = signer_from_secret(&format!("0x{ANVIL_KEY}")).unwrap();
        assert_eq!(prefixed.address(), ANVIL_ADDRESS);
    }

    #[test]
    fn test_signer_from_mnemonic() {
        let signer = signer_from_secret(ANVIL_MNEMONIC).unwrap();
        assert_eq!(signer.address(), ANVIL_ADDRESS);
    }

    #[test]
    fn test_invalid_secret() {
        assert!(matches!(
            signer_from_secret("not a key"),
            Err(SdkError::ConfigError(ConfigError::InvalidWalletSecret))
        ));
    }

    #[test]
    fn test_client_switches_keep_the_other_half() {
        let client = AlloyClient::new(None, ANVIL_KEY).unwrap();
        assert_eq!(client.rpc_url().as_str(), DEFAULT_RPC_URL);

        let moved = client.with_rpc_url("http://localhost:8545").unwrap();
        assert_eq!(moved.wallet(), ANVIL_ADDRESS);
        assert_eq!(moved.rpc_url().as_str(), "http://localhost:8545/");

        let other = moved
            .with_wallet("59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d")
            .unwrap();
        assert_ne!(other.wallet(), ANVIL_ADDRESS);
        assert_eq!(other.rpc_url(), moved.rpc_url());
    }

    #[test]
    fn test_invalid_rpc_url() {
        assert!(matches!(
            AlloyClient::new(Some("not a url"), ANVIL_KEY),
            Err(SdkError::InvalidUrl(_))
        ));
    }
}
