use defi_sdk::{DefiSdk, Priceable};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt::init();

    let rpc_endpoint = std::env::var("BSC_RPC_ENDPOINT").ok();
    let secret = std::env::var("WALLET_SECRET")?;

    let sdk = DefiSdk::new(rpc_endpoint.as_deref(), &secret).await?;
    println!("defi-sdk {}", defi_sdk::consts::VERSION);
    println!("Wallet balance: {} BNB", sdk.wallet_balance().await?);

    let registry = sdk.registry();
    for (name, exchange) in &registry.exchanges {
        for (key, pair) in &exchange.pairs {
            // Only meaningful when both tokens have 18 decimals
            println!("{name} {key}: {}", pair.price().await?);
        }
    }

    Ok(())
}
