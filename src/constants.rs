use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;

pub const SOLANA_RPC_ENDPOINT: &str = "https://api.mainnet-beta.solana.com";
pub const JUPITER_API_ENDPOINT: &str = "https://quote-api.jup.ag/v6";
pub const SOLSCAN_TX_URL: &str = "https://solscan.io/tx";

pub const WSOL_MINT: Pubkey = pubkey!("So11111111111111111111111111111111111111112");
pub const USDC_MINT: Pubkey = pubkey!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");

pub const TOKEN_PROGRAM_ADDR: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
pub const TOKEN_2022_PROGRAM_ADDR: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";

pub const SOL_DECIMALS: u8 = 9;

pub const DEFAULT_SLIPPAGE: &str = "1";
pub const DEFAULT_PRIORITY_FEE: &str = "5";

pub const MIN_SLIPPAGE_PERCENT: f64 = 0.1;
pub const MAX_SLIPPAGE_PERCENT: f64 = 50.0;

/// 1 micro-SOL = 1_000 lamports
pub const LAMPORTS_PER_MICRO_SOL: u64 = 1_000;

pub const SEND_MAX_RETRIES: usize = 3;
