use anyhow::{Context, Result};
use solana_rpc_lite::{
    lamports_to_sol, load_config, ClientConfig, SolanaClient, TokenAccountsOptions,
    TransactionOptions,
};
use std::path::Path;

const CONFIG_PATH: &str = "config.json";
const USAGE: &str = "usage: solana-rpc-lite <balance <pubkey> | tokens <owner> [mint] | tx <signature> [from] [to]>";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    // Load configuration, falling back to mainnet-beta
    let config = if Path::new(CONFIG_PATH).exists() {
        load_config(CONFIG_PATH)?
    } else {
        log::info!("No {} found, using {}", CONFIG_PATH, ClientConfig::default().rpc_url);
        ClientConfig::default()
    };

    let client = SolanaClient::from_config(&config).context("Failed to create RPC client")?;

    match args.first().map(String::as_str) {
        Some("balance") => {
            let pubkey = args.get(1).context(USAGE)?;
            let balance = client.get_balance(pubkey, None).await?;
            log::info!("💰 Balance: {:.9} SOL (slot {})", lamports_to_sol(balance.lamports), balance.slot);
        }
        Some("tokens") => {
            let owner = args.get(1).context(USAGE)?;
            let mut options = TokenAccountsOptions::default();
            if let Some(mint) = args.get(2) {
                options = options.mint(mint.as_str());
            }

            let result = client.get_token_accounts(owner, options).await?;
            log::info!("🪙 {} token accounts (limit {})", result.total, result.limit);
            for account in &result.token_accounts {
                log::info!("   - {} mint={} amount={}{}",
                    account.address,
                    account.mint,
                    account.amount,
                    if account.frozen { " (frozen)" } else { "" });
            }
            if let Some(cursor) = &result.cursor {
                log::info!("   next cursor: {}", cursor);
            }
        }
        Some("tx") => {
            let signature = args.get(1).context(USAGE)?;
            let mut options = TransactionOptions::default();
            if let Some(from) = args.get(2) {
                options = options.from_pk(from.as_str());
            }
            if let Some(to) = args.get(3) {
                options = options.to_pk(to.as_str());
            }

            let tx = client.get_transaction(signature, options).await?;
            log::info!("🧾 Transaction in slot {} ({} accounts, fee {} lamports)",
                tx.slot(),
                tx.transaction().account_keys.len(),
                tx.meta().fee);
            if let Some(time) = tx.block_datetime() {
                log::info!("   Block time: {}", time.to_rfc3339());
            }
            if let Some(err) = &tx.meta().err {
                log::warn!("⚠️ Transaction failed: {}", err);
            }
            if let Some(sent) = tx.send_sol_amount() {
                log::info!("📤 Sent: {:.9} SOL", lamports_to_sol(sent));
            }
            if let Some(received) = tx.sol_amount() {
                log::info!("📥 Received: {:.9} SOL", lamports_to_sol(received));
            }
        }
        _ => anyhow::bail!(USAGE),
    }

    Ok(())
}
