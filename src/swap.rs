use std::{
    collections::BTreeMap,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use alloy::primitives::{Address, U256};
use tracing::{debug, instrument, warn};

use crate::{
    client::DexClient,
    consts::{
        DEFAULT_GAS_LIMIT, DEFAULT_SLIPPAGE_PERCENT, GAS_PRICE_WEI, SLIPPAGE_SCALE,
        SWAP_DEADLINE_SECS, U256_SLIPPAGE_SCALE,
    },
    errors::SdkError,
    handles::RouterHandle,
    units::parse_amount,
};

/// Arguments of a `swapExactTokensForTokens` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub amount_in: U256,
    pub amount_out_min: U256,
    pub path: Vec<Address>,
    pub to: Address,
    pub deadline: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasSettings {
    pub gas_limit: u64,
    pub gas_price: u128,
}

/// Quotes and submits direct two token swaps through one exchange's router.
#[derive(Debug)]
pub struct Swapper<C> {
    exchange: String,
    router: RouterHandle<C>,
    tokens: Arc<BTreeMap<String, Address>>,
}

impl<C: DexClient> Swapper<C> {
    pub fn new(
        exchange: impl Into<String>,
        router: RouterHandle<C>,
        tokens: Arc<BTreeMap<String, Address>>,
    ) -> Self {
        Self {
            exchange: exchange.into(),
            router,
            tokens,
        }
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn router(&self) -> &RouterHandle<C> {
        &self.router
    }

    pub fn client(&self) -> &Arc<C> {
        self.router.client()
    }

    /// Address of `symbol` in this exchange's token table.
    pub fn token_address(&self, symbol: &str) -> Result<Address, SdkError> {
        self.tokens
            .get(symbol)
            .copied()
            .ok_or_else(|| SdkError::UnknownToken(symbol.to_string()))
    }

    /// Swaps a decimal `amount_in` of `from` for `to`.
    ///
    /// `slippage_percent` defaults to 0.5 when `None`. The returned transaction is
    /// only submitted, not confirmed.
    pub async fn swap(
        &self,
        amount_in: &str,
        from: &str,
        to: &str,
        slippage_percent: Option<f64>,
    ) -> Result<C::PendingTx, SdkError> {
        let amount_in = parse_amount(amount_in)?;
        self.swap_exact(amount_in, from, to, slippage_percent).await
    }

    /// Same as [`Swapper::swap`] with an amount already in the token's smallest unit.
    #[instrument(skip(self), fields(exchange = %self.exchange), level = "debug")]
    pub async fn swap_exact(
        &self,
        amount_in: U256,
        from: &str,
        to: &str,
        slippage_percent: Option<f64>,
    ) -> Result<C::PendingTx, SdkError> {
        let request = self
            .build_swap(amount_in, from, to, slippage_percent)
            .await?;

        // Estimation is best effort, a failing estimate falls back to the default limit
        let gas_limit = match self
            .client()
            .estimate_swap_gas(self.router.address, &request)
            .await
        {
            Ok(gas_limit) => gas_limit,
            Err(err) => {
                warn!(
                    target = "defi_sdk::swap",
                    error = %err,
                    gas_limit = DEFAULT_GAS_LIMIT,
                    "Gas estimation failed, using default gas limit"
                );
                DEFAULT_GAS_LIMIT
            }
        };

        let gas = GasSettings {
            gas_limit,
            gas_price: GAS_PRICE_WEI,
        };

        self.client()
            .send_swap(self.router.address, &request, gas)
            .await
    }

    /// Expected output of swapping `amount_in` of `from` for `to` on the direct pair.
    pub async fn quote(&self, amount_in: U256, from: &str, to: &str) -> Result<U256, SdkError> {
        let path = [self.token_address(from)?, self.token_address(to)?];
        let amounts = self.router.get_amounts_out(amount_in, &path).await?;

        match amounts.as_slice() {
            [_, amount_out] => Ok(*amount_out),
            _ => Err(SdkError::MalformedQuote(amounts.len())),
        }
    }

    /// Quotes the swap and assembles the call, without submitting it.
    pub async fn build_swap(
        &self,
        amount_in: U256,
        from: &str,
        to: &str,
        slippage_percent: Option<f64>,
    ) -> Result<SwapRequest, SdkError> {
        let slippage_percent = slippage_percent.unwrap_or(DEFAULT_SLIPPAGE_PERCENT);
        validate_slippage(slippage_percent)?;

        let expected_out = self.quote(amount_in, from, to).await?;
        let amount_out_min = min_amount_out(expected_out, slippage_percent)?;

        debug!(
            target = "defi_sdk::swap",
            %amount_in,
            %expected_out,
            %amount_out_min,
            from,
            to,
            "Quoted swap"
        );

        Ok(SwapRequest {
            amount_in,
            amount_out_min,
            path: vec![self.token_address(from)?, self.token_address(to)?],
            to: self.client().wallet(),
            deadline: deadline_from(unix_now()),
        })
    }
}

fn validate_slippage(slippage_percent: f64) -> Result<(), SdkError> {
    if !slippage_percent.is_finite() || !(0.0..=100.0).contains(&slippage_percent) {
        return Err(SdkError::InvalidSlippage(slippage_percent));
    }
    Ok(())
}

/// `expected_out * (1 - slippage_percent / 100)`, rounded down to the smallest unit.
///
/// The percentage is applied with a resolution of 0.0001%.
pub fn min_amount_out(expected_out: U256, slippage_percent: f64) -> Result<U256, SdkError> {
    validate_slippage(slippage_percent)?;

    let slippage = (slippage_percent * (SLIPPAGE_SCALE as f64 / 100.0)).round() as u64;
    let kept = U256::from(SLIPPAGE_SCALE - slippage.min(SLIPPAGE_SCALE));

    Ok(match expected_out.checked_mul(kept) {
        Some(scaled) => scaled / U256_SLIPPAGE_SCALE,
        None => expected_out / U256_SLIPPAGE_SCALE * kept,
    })
}

pub fn deadline_from(now_secs: u64) -> U256 {
    U256::from(now_secs + SWAP_DEADLINE_SECS)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alloy::primitives::U256;

    use super::*;
    use crate::{
        mock::{MockDexClient, ALICE, CAKE, ROUTER},
        units::parse_amount,
    };

    fn swapper(client: MockDexClient) -> Swapper<MockDexClient> {
        let client = Arc::new(client);
        let tokens = [("CAKE".to_string(), CAKE), ("BUSD".to_string(), crate::consts::BUSD)]
            .into_iter()
            .collect();
        Swapper::new(
            "PancakeSwap",
            RouterHandle::new(ROUTER, client),
            Arc::new(tokens),
        )
    }

    #[test]
    fn test_min_amount_out() {
        let expected = parse_amount("100").unwrap();
        assert_eq!(
            min_amount_out(expected, 0.5).unwrap(),
            parse_amount("99.5").unwrap()
        );
        assert_eq!(min_amount_out(expected, 0.0).unwrap(), expected);
        assert_eq!(min_amount_out(expected, 100.0).unwrap(), U256::ZERO);
        assert_eq!(
            min_amount_out(U256::from(1000), 1.0).unwrap(),
            U256::from(990)
        );
    }

    #[test]
    fn test_min_amount_out_does_not_overflow() {
        let min_out = min_amount_out(U256::MAX, 0.5).unwrap();
        assert!(min_out < U256::MAX);
        assert!(min_out > U256::MAX / U256::from(2));
    }

    #[test]
    fn test_invalid_slippage() {
        for slippage in [-0.1, 100.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                min_amount_out(U256::from(1), slippage),
                Err(SdkError::InvalidSlippage(_))
            ));
        }
    }

    #[test]
    fn test_deadline_is_ten_minutes_out() {
        assert_eq!(deadline_from(1_700_000_000), U256::from(1_700_000_600_u64));
    }

    #[tokio::test]
    async fn test_swap_submits_slippage_adjusted_call() {
        let client = MockDexClient::new(ALICE).with_fixed_quote(parse_amount("100").unwrap());
        let swapper = swapper(client);

        swapper.swap("2", "CAKE", "BUSD", Some(1.0)).await.unwrap();

        let sent = swapper.client().sent_swaps();
        assert_eq!(sent.len(), 1);
        let (router, request, gas) = &sent[0];
        assert_eq!(*router, ROUTER);
        assert_eq!(request.amount_in, parse_amount("2").unwrap());
        assert_eq!(request.amount_out_min, parse_amount("99").unwrap());
        assert_eq!(request.path, vec![CAKE, crate::consts::BUSD]);
        assert_eq!(request.to, ALICE);
        assert_eq!(gas.gas_price, 5_000_000_000);
        assert_eq!(gas.gas_limit, MockDexClient::ESTIMATED_GAS);
    }

    #[tokio::test]
    async fn test_default_slippage_matches_half_percent() {
        let quote = parse_amount("100").unwrap();
        let swapper = swapper(MockDexClient::new(ALICE).with_fixed_quote(quote));

        swapper.swap("1", "CAKE", "BUSD", None).await.unwrap();
        swapper.swap("1", "CAKE", "BUSD", Some(0.5)).await.unwrap();

        let sent = swapper.client().sent_swaps();
        assert_eq!(sent[0].1.amount_out_min, sent[1].1.amount_out_min);
        assert_eq!(sent[0].1.amount_out_min, parse_amount("99.5").unwrap());
    }

    #[tokio::test]
    async fn test_gas_estimation_failure_uses_default_limit() {
        let client = MockDexClient::new(ALICE).with_failing_gas_estimate();
        let swapper = swapper(client);

        swapper.swap("1", "CAKE", "BUSD", None).await.unwrap();

        let sent = swapper.client().sent_swaps();
        assert_eq!(sent[0].2.gas_limit, 150_000);
    }

    #[tokio::test]
    async fn test_quote_failure_aborts_before_submission() {
        let client = MockDexClient::new(ALICE).with_failing_quotes();
        let swapper = swapper(client);

        assert!(swapper.swap("1", "CAKE", "BUSD", None).await.is_err());
        assert!(swapper.client().sent_swaps().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let swapper = swapper(MockDexClient::new(ALICE));

        let err = swapper.swap("1", "CAKE", "DOGE", None).await.unwrap_err();
        assert!(matches!(err, SdkError::UnknownToken(symbol) if symbol == "DOGE"));
        assert!(swapper.client().sent_swaps().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_amount_aborts() {
        let swapper = swapper(MockDexClient::new(ALICE));

        assert!(swapper.swap("one", "CAKE", "BUSD", None).await.is_err());
        assert_eq!(swapper.client().quote_calls(), 0);
    }
}
