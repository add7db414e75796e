use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{info, instrument};

use crate::{
    client::{AlloyClient, DexClient},
    config::Config,
    errors::SdkError,
    notify::Notifier,
    registry::{self, Registry},
    units::format_amount,
};

/// A session: one wallet, one provider and the registry built for them.
///
/// Readers get a consistent [`Registry`] snapshot from [`DefiSdk::registry`].
/// Rebuilds run one at a time and replace the snapshot only when they succeed,
/// a failed rebuild leaves the previous registry, client and table in place.
pub struct DefiSdk<C> {
    config: ArcSwap<Config>,
    registry: ArcSwap<Registry<C>>,
    rebuild_lock: Mutex<()>,
    notifier: ArcSwapOption<Notifier>,
}

impl<C: DexClient> DefiSdk<C> {
    pub async fn connect(config: Config, client: C) -> Result<Self, SdkError> {
        let registry = registry::build(&config, Arc::new(client)).await?;

        Ok(Self {
            config: ArcSwap::from_pointee(config),
            registry: ArcSwap::from_pointee(registry),
            rebuild_lock: Mutex::new(()),
            notifier: ArcSwapOption::empty(),
        })
    }

    pub fn registry(&self) -> Arc<Registry<C>> {
        self.registry.load_full()
    }

    pub fn config(&self) -> Arc<Config> {
        self.config.load_full()
    }

    pub fn client(&self) -> Arc<C> {
        self.registry.load().client().clone()
    }

    /// Rebuilds the registry against the current chain state.
    pub async fn reload(&self) -> Result<Arc<Registry<C>>, SdkError> {
        self.rebuild(None, |current| Ok(current.clone())).await
    }

    /// Switches wallet and/or provider.
    pub async fn set_client(&self, client: C) -> Result<Arc<Registry<C>>, SdkError> {
        self.rebuild(None, move |_| Ok(Arc::new(client))).await
    }

    /// Derives the next client from the active one and rebuilds for it.
    ///
    /// `update` runs under the rebuild lock, so concurrent updates see each other's results.
    pub async fn update_client<F>(&self, update: F) -> Result<Arc<Registry<C>>, SdkError>
    where
        F: FnOnce(&C) -> Result<C, SdkError> + Send,
    {
        self.rebuild(None, |current| update(current.as_ref()).map(Arc::new))
            .await
    }

    /// Replaces the contract table.
    pub async fn load_contracts(&self, config: Config) -> Result<Arc<Registry<C>>, SdkError> {
        self.rebuild(Some(config), |current| Ok(current.clone()))
            .await
    }

    #[instrument(skip_all, level = "debug")]
    async fn rebuild<F>(
        &self,
        config: Option<Config>,
        next_client: F,
    ) -> Result<Arc<Registry<C>>, SdkError>
    where
        F: FnOnce(&Arc<C>) -> Result<Arc<C>, SdkError> + Send,
    {
        let _guard = self.rebuild_lock.lock().await;

        let config = config.map(Arc::new).unwrap_or_else(|| self.config.load_full());
        let client = next_client(&self.client())?;
        let registry = Arc::new(registry::build(&config, client).await?);

        self.config.store(config);
        self.registry.store(registry.clone());
        info!(target = "defi_sdk::sdk", "Registry replaced");

        Ok(registry)
    }

    /// Native coin balance of the wallet, formatted with 18 decimals.
    pub async fn wallet_balance(&self) -> Result<f64, SdkError> {
        let client = self.client();
        format_amount(client.native_balance(client.wallet()).await?)
    }

    /// Swaps on `exchange` using the current registry.
    pub async fn swap(
        &self,
        exchange: &str,
        amount_in: &str,
        from: &str,
        to: &str,
        slippage_percent: Option<f64>,
    ) -> Result<C::PendingTx, SdkError> {
        let registry = self.registry();
        registry
            .exchange(exchange)?
            .swap(amount_in, from, to, slippage_percent)
            .await
    }

    pub fn set_line_token(&self, token: &str) -> Result<(), SdkError> {
        self.notifier.store(Some(Arc::new(Notifier::new(token)?)));
        Ok(())
    }

    pub fn set_notifier(&self, notifier: Notifier) {
        self.notifier.store(Some(Arc::new(notifier)));
    }

    /// Sends `message` through the configured notifier without waiting for the response.
    ///
    /// Failures are logged. Returns `None` when no notifier is configured.
    pub fn send_msg(&self, message: &str) -> Option<JoinHandle<()>> {
        self.notifier
            .load_full()
            .map(|notifier| notifier.send_detached(message))
    }
}

impl DefiSdk<AlloyClient> {
    /// Connects to `rpc_url` (the public BSC endpoint when `None`) with the BSC
    /// contract table and a wallet from a private key or mnemonic.
    pub async fn new(rpc_url: Option<&str>, secret: &str) -> Result<Self, SdkError> {
        Self::connect(Config::bsc(), AlloyClient::new(rpc_url, secret)?).await
    }

    pub async fn set_rpc(&self, rpc_url: &str) -> Result<Arc<Registry<AlloyClient>>, SdkError> {
        self.update_client(|current| current.with_rpc_url(rpc_url))
            .await
    }

    pub async fn set_wallet(&self, secret: &str) -> Result<Arc<Registry<AlloyClient>>, SdkError> {
        self.update_client(|current| current.with_wallet(secret))
            .await
    }
}
