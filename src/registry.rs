use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    sync::Arc,
};

use alloy::primitives::Address;
use futures::{stream::FuturesUnordered, StreamExt};
use tracing::{debug, info, instrument};

use crate::{
    client::DexClient,
    config::{Config, ExchangeConfig},
    consts::{BUSD, BUSD_SYMBOL, WBNB, WBNB_SYMBOL},
    errors::SdkError,
    handles::{pair_key, FactoryHandle, PairHandle, RouterHandle, TokenHandle},
    swap::Swapper,
};

/// Every handle a session binds to, built in one pass and never mutated afterwards.
#[derive(Debug)]
pub struct Registry<C> {
    pub tokens: BTreeMap<String, TokenHandle<C>>,
    pub exchanges: BTreeMap<String, Exchange<C>>,
    client: Arc<C>,
}

#[derive(Debug)]
pub struct Exchange<C> {
    pub name: String,
    pub factory: FactoryHandle<C>,
    pub pairs: BTreeMap<String, PairHandle<C>>,
    swapper: Arc<Swapper<C>>,
}

impl<C: DexClient> Registry<C> {
    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn token(&self, symbol: &str) -> Result<&TokenHandle<C>, SdkError> {
        self.tokens
            .get(symbol)
            .ok_or_else(|| SdkError::UnknownToken(symbol.to_string()))
    }

    pub fn exchange(&self, name: &str) -> Result<&Exchange<C>, SdkError> {
        self.exchanges
            .get(name)
            .ok_or_else(|| SdkError::UnknownExchange(name.to_string()))
    }

    /// `exchange -> pair keys`, handy to compare two builds.
    pub fn pair_keys(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        self.exchanges
            .iter()
            .map(|(name, exchange)| {
                (
                    name.as_str(),
                    exchange.pairs.keys().map(String::as_str).collect(),
                )
            })
            .collect()
    }
}

impl<C: DexClient> Exchange<C> {
    pub fn router(&self) -> &RouterHandle<C> {
        self.swapper.router()
    }

    pub fn swapper(&self) -> &Arc<Swapper<C>> {
        &self.swapper
    }

    pub fn pair(&self, key: &str) -> Result<&PairHandle<C>, SdkError> {
        self.pairs
            .get(key)
            .ok_or_else(|| SdkError::UnknownPair(key.to_string()))
    }

    /// Swaps a decimal `amount_in` of `from` for `to` through this exchange's router.
    pub async fn swap(
        &self,
        amount_in: &str,
        from: &str,
        to: &str,
        slippage_percent: Option<f64>,
    ) -> Result<C::PendingTx, SdkError> {
        self.swapper
            .swap(amount_in, from, to, slippage_percent)
            .await
    }
}

/// A pair the registry will look up on an exchange's factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairCandidate {
    pub key: String,
    pub base: Address,
    pub quote: Address,
}

/// Pairs to look up on one exchange, in priority order.
///
/// For every configured token the exchange's stables come first, then BUSD, then
/// WBNB. A key produced by an earlier generator is never looked up again, so a
/// stable named `BUSD` replaces the default BUSD pair instead of racing it.
pub fn plan_pairs(tokens: &BTreeMap<String, Address>, exchange: &ExchangeConfig) -> Vec<PairCandidate> {
    let defaults = [(BUSD_SYMBOL, BUSD), (WBNB_SYMBOL, WBNB)];
    let mut seen = HashSet::new();
    let mut candidates = vec![];

    for (symbol, base) in tokens {
        let quotes = exchange
            .stables
            .iter()
            .map(|(stable, address)| (stable.as_str(), *address))
            .chain(defaults);

        for (quote_symbol, quote) in quotes {
            let key = pair_key(symbol, quote_symbol);
            if !seen.insert(key.clone()) {
                continue;
            }

            // A token can't be pooled with itself
            if *base == quote {
                debug!(target = "defi_sdk::registry", key = %key, "Skipping self pair");
                continue;
            }

            candidates.push(PairCandidate {
                key,
                base: *base,
                quote,
            });
        }
    }

    candidates
}

/// Binds every token, factory, router and pair of `config` to `client`.
///
/// All factory lookups run concurrently. Any failing lookup fails the whole build.
#[instrument(skip_all, level = "debug")]
pub async fn build<C: DexClient>(config: &Config, client: Arc<C>) -> Result<Registry<C>, SdkError> {
    config.validate()?;

    let mut tokens: BTreeMap<String, TokenHandle<C>> = config
        .tokens
        .iter()
        .map(|(symbol, address)| {
            (
                symbol.clone(),
                TokenHandle::new(symbol.clone(), *address, client.clone()),
            )
        })
        .collect();

    let mut plans = vec![];
    for (name, exchange_config) in &config.amm {
        // Stables extend this exchange's table and overwrite same-named tokens in it
        let mut table = config.tokens.clone();
        for (symbol, address) in &exchange_config.stables {
            table.insert(symbol.clone(), *address);
            tokens
                .entry(symbol.clone())
                .or_insert_with(|| TokenHandle::new(symbol.clone(), *address, client.clone()));
        }

        let swapper = Arc::new(Swapper::new(
            name.clone(),
            RouterHandle::new(exchange_config.router, client.clone()),
            Arc::new(table),
        ));
        let factory = FactoryHandle::new(exchange_config.factory, client.clone());
        let candidates = plan_pairs(&config.tokens, exchange_config);

        plans.push((name.clone(), factory, swapper, candidates));
    }

    let mut lookups = FuturesUnordered::new();
    for (name, factory, _, candidates) in &plans {
        for candidate in candidates {
            lookups.push(async move {
                let pair = factory.get_pair(candidate.base, candidate.quote).await?;
                Ok::<_, SdkError>((name.as_str(), candidate.key.as_str(), pair))
            });
        }
    }

    let mut discovered: BTreeMap<&str, Vec<(&str, Address)>> = BTreeMap::new();
    while let Some(res) = lookups.next().await {
        let (exchange, key, pair) = res?;
        if pair.is_zero() {
            debug!(target = "defi_sdk::registry", exchange, key, "No pool");
            continue;
        }
        discovered.entry(exchange).or_default().push((key, pair));
    }
    drop(lookups);

    let mut exchanges = BTreeMap::new();
    for (name, factory, swapper, _) in &plans {
        let mut pairs = BTreeMap::new();
        for (key, address) in discovered.remove(name.as_str()).unwrap_or_default() {
            pairs.insert(
                key.to_string(),
                PairHandle::new(key, address, swapper.clone())?,
            );
        }

        info!(
            target = "defi_sdk::registry",
            exchange = %name,
            factory = ?factory.address,
            router = ?swapper.router().address,
            pairs = pairs.len(),
            "Exchange bound"
        );

        exchanges.insert(
            name.clone(),
            Exchange {
                name: name.clone(),
                factory: FactoryHandle::new(factory.address, client.clone()),
                pairs,
                swapper: swapper.clone(),
            },
        );
    }

    info!(
        target = "defi_sdk::registry",
        wallet = ?client.wallet(),
        tokens = tokens.len(),
        exchanges = exchanges.len(),
        "Registry built"
    );

    Ok(Registry {
        tokens,
        exchanges,
        client,
    })
}
