mod chain;
mod config;
mod constants;
mod error;
mod form;
mod jupiter;
mod metrics;
mod server;
mod swap;

use crate::chain::SolanaRpc;
use crate::config::QuickTradeArgs;
use crate::form::{Side, SwapForm};
use crate::jupiter::JupiterClient;
use crate::server::AppState;
use crate::swap::SwapController;

use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "quickytrade", version, about = "Swap SOL for any Solana token through Jupiter")]
struct Cli {
    /// YAML config file (defaults to ./config.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Quote, sign, submit and confirm a swap
    Swap(OrderArgs),
    /// Fetch a quote without signing anything
    Quote(OrderArgs),
    /// Serve the swap form on the configured address
    Serve,
}

#[derive(Args)]
struct OrderArgs {
    /// Token mint address (defaults to the configured mint)
    #[arg(long)]
    token: Option<String>,

    /// SOL to spend, or tokens to sell with --sell
    #[arg(long)]
    amount: String,

    /// Slippage tolerance in percent
    #[arg(long)]
    slippage: Option<String>,

    /// Priority fee cap in micro-SOL
    #[arg(long)]
    priority_fee: Option<String>,

    /// Sell the token for SOL instead of buying it
    #[arg(long)]
    sell: bool,
}

impl OrderArgs {
    fn into_form(self, args: &QuickTradeArgs) -> SwapForm {
        SwapForm {
            private_key: args.private_key.clone().unwrap_or_default(),
            token_mint: self.token.unwrap_or_else(|| args.defaults.token_mint.clone()),
            amount: self.amount,
            slippage: self.slippage.unwrap_or_else(|| args.defaults.slippage.clone()),
            priority_fee: self
                .priority_fee
                .unwrap_or_else(|| args.defaults.priority_fee.clone()),
            side: if self.sell { Side::Sell } else { Side::Buy },
        }
    }
}

fn build_controller(args: &QuickTradeArgs) -> anyhow::Result<SwapController> {
    let aggregator = JupiterClient::new(
        args.jupiter.base_url.clone(),
        args.jupiter.api_key.clone(),
        args.jupiter_timeout(),
    )?;
    let rpc = SolanaRpc::new(args.rpc_url.clone());

    Ok(SwapController::new(
        Arc::new(aggregator),
        Arc::new(rpc),
        args.swap_settings()?,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let args = QuickTradeArgs::load(cli.config.as_deref())?;
    info!("Loaded config: {:?}", args);

    let controller = build_controller(&args)?;

    match cli.command {
        Command::Swap(order) => {
            let form = order.into_form(&args);
            match controller.execute(&form).await {
                Ok(receipt) => {
                    println!("{}", receipt.quote.render());
                    println!("{}", receipt.success_message());
                    println!("{}", receipt.explorer_url());
                }
                Err(e) => {
                    error!("{}", e);
                    if let Some(signature) = e.signature() {
                        println!("{}", swap::explorer_url(&signature));
                    }
                    return Err(e.into());
                }
            }
        }
        Command::Quote(order) => {
            let form = order.into_form(&args);
            let summary = controller.quote(&form).await?;
            println!("{}", summary.render());
        }
        Command::Serve => {
            let addr = args.bind_addr()?;
            let state = Arc::new(AppState::new(controller, &args.defaults));
            let shutdown = CancellationToken::new();

            let server = tokio::spawn(server::serve(addr, state, shutdown.clone()));

            tokio::signal::ctrl_c().await?;
            info!("Shutting down");
            shutdown.cancel();
            server.await??;
        }
    }

    Ok(())
}
