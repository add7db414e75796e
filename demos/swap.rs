use defi_sdk::{Balance, DefiSdk, Tradeable};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt::init();

    let rpc_endpoint = std::env::var("BSC_RPC_ENDPOINT").ok();
    let secret = std::env::var("WALLET_SECRET")?;

    let sdk = DefiSdk::new(rpc_endpoint.as_deref(), &secret).await?;
    if let Ok(token) = std::env::var("LINE_TOKEN") {
        sdk.set_line_token(&token)?;
    }

    let registry = sdk.registry();
    println!("CAKE balance: {}", registry.token("CAKE")?.balance().await?);

    // Sell 0.1 CAKE for BUSD on PancakeSwap with the default 0.5% slippage
    let pair = registry.exchange("PancakeSwap")?.pair("CAKE_BUSD")?;
    let pending = pair.sell(Some("0.1")).await?;
    println!("Submitted {}", pending.tx_hash());

    let receipt = pending.get_receipt().await?;
    // Wait for the notification so it isn't dropped when main returns
    if let Some(sent) = sdk.send_msg(&format!("CAKE sold in block {:?}", receipt.block_number)) {
        sent.await?;
    }

    Ok(())
}
