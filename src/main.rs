use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{error, info, warn};
use solana_sdk::native_token::{lamports_to_sol, sol_to_lamports};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;

use solana_priority_sender::common::constants::{
    Env, DEFAULT_FEE_ACCOUNT, DEFAULT_PRIORITY_RATE, PROJECT_NAME,
};
use solana_priority_sender::common::utils::{redacted_endpoint, setup_logger};
use solana_priority_sender::execution::{TransferExecutor, TransferIntent};
use solana_priority_sender::fees::FeeSampler;
use solana_priority_sender::rpc::{RpcSolanaApi, SolanaApi};

#[derive(Parser)]
#[command(
    name = "solana-priority-sender",
    version,
    about = "Sample Solana prioritization fees and send fee-adjusted transfers"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample recent prioritization fees and print summary statistics
    Fees {
        /// Writable accounts to restrict the samples to (defaults to the
        /// Jupiter aggregator program)
        #[arg(long = "account", value_name = "PUBKEY")]
        accounts: Vec<Pubkey>,
        /// Print the summary as JSON instead of log lines
        #[arg(long)]
        json: bool,
    },
    /// Build, sign and send a prioritized transfer, then wait for confirmation
    Send {
        /// Recipient of the transfer (defaults to the sender itself)
        #[arg(long = "to", value_name = "PUBKEY")]
        recipient: Option<Pubkey>,
        /// Amount to transfer in SOL
        #[arg(long, default_value_t = 0.001)]
        amount_sol: f64,
        /// Priority fee rate in micro-lamports per compute unit; sampled
        /// from the cluster when omitted
        #[arg(long)]
        priority_rate: Option<u64>,
        /// RPC-side resend budget for the signed transaction
        #[arg(long, default_value_t = 15)]
        max_retries: usize,
        /// Print the submission result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    setup_logger()?;

    let cli = Cli::parse();
    info!("Starting {}", PROJECT_NAME);

    let env = Env::load()?;
    info!("Connected to Solana RPC at {}", redacted_endpoint(&env.rpc_url));
    if let Some(wss) = &env.wss_rpc_url {
        info!("Streaming endpoint configured at {}", redacted_endpoint(wss));
    }

    let api: Arc<dyn SolanaApi> = Arc::new(RpcSolanaApi::new(env.rpc_url.clone()));

    match cli.command {
        Commands::Fees { accounts, json } => run_fees(api, accounts, json).await,
        Commands::Send {
            recipient,
            amount_sol,
            priority_rate,
            max_retries,
            json,
        } => {
            run_send(
                api,
                &env,
                recipient,
                amount_sol,
                priority_rate,
                max_retries,
                json,
            )
            .await
        }
    }
}

async fn run_fees(api: Arc<dyn SolanaApi>, accounts: Vec<Pubkey>, json: bool) -> Result<()> {
    let accounts = if accounts.is_empty() {
        vec![Pubkey::from_str(DEFAULT_FEE_ACCOUNT)?]
    } else {
        accounts
    };

    let sampler = FeeSampler::new(api);
    let summary = sampler.sample(&accounts).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.sample_count == 0 {
        warn!("No prioritization fee data available for the given accounts");
        return Ok(());
    }

    info!("Slots examined for priority fees: {}", summary.sample_count);
    info!(
        "Slots range examined from {} to {}",
        summary.slot_range_start, summary.slot_range_end
    );
    info!(
        "💰 Average prioritization fee (including slots with zero fees): {} micro-lamports",
        summary.mean_including_zeros
    );
    info!(
        "💰 Average prioritization fee (excluding slots with zero fees): {} micro-lamports",
        summary.mean_excluding_zeros
    );
    info!(
        "💰 Median prioritization fee (excluding slots with zero fees): {} micro-lamports",
        summary.median_excluding_zeros
    );
    Ok(())
}

async fn run_send(
    api: Arc<dyn SolanaApi>,
    env: &Env,
    recipient: Option<Pubkey>,
    amount_sol: f64,
    priority_rate: Option<u64>,
    max_retries: usize,
    json: bool,
) -> Result<()> {
    let sender = env.keypair()?;
    info!("Initial setup: wallet public key {}", sender.pubkey());

    let recipient = recipient.unwrap_or_else(|| sender.pubkey());

    let priority_fee = match priority_rate {
        Some(rate) => rate,
        None => {
            let mut fee_accounts = vec![sender.pubkey()];
            if recipient != sender.pubkey() {
                fee_accounts.push(recipient);
            }
            let summary = FeeSampler::new(api.clone()).sample(&fee_accounts).await?;
            if summary.median_excluding_zeros > 0 {
                info!(
                    "Sampled median priority fee: {} micro-lamports over {} slots",
                    summary.median_excluding_zeros, summary.sample_count
                );
                summary.median_excluding_zeros
            } else {
                warn!(
                    "No non-zero fee samples; falling back to {} micro-lamports",
                    DEFAULT_PRIORITY_RATE
                );
                DEFAULT_PRIORITY_RATE
            }
        }
    };

    info!(
        "Sending {} SOL from {} to {} with priority fee rate {} micro-lamports",
        amount_sol,
        sender.pubkey(),
        recipient,
        priority_fee
    );

    let intent = TransferIntent {
        sender,
        recipient,
        amount_lamports: sol_to_lamports(amount_sol),
        priority_fee_microlamports: priority_fee,
    };

    let executor = TransferExecutor::new(api);
    match executor.submit(&intent, max_retries).await {
        Ok(result) => {
            println!(
                "{}",
                "🚀 Transaction successfully confirmed!".green().bold()
            );
            println!(
                "{}",
                format!("https://solscan.io/tx/{}", result.signature).cyan()
            );
            match result.fee_lamports {
                Some(fee) => info!(
                    "Transaction fee: {} lamports ({:.9} SOL)",
                    fee,
                    lamports_to_sol(fee)
                ),
                None => warn!("Transaction fee not yet available from the cluster"),
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            Ok(())
        }
        Err(e) => {
            error!("🚨 {}", e);
            Err(e.into())
        }
    }
}
