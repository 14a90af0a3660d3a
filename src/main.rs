//! triad - command-line client for the triad prediction-market program
//!
//! Every facade operation and read path is exposed as a subcommand. Results
//! are printed as JSON on stdout; logs go to stderr.

#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(unused_must_use)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use solana_sdk::{pubkey::Pubkey, signature::Keypair};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use triad_client::client::{
    AddLiquidityRequest, ClaimStakeRewardsRequest, CollectFeeRequest, CreateCollectionRequest,
    CreateUserRequest, InitializeMarketRequest, MintTicketRequest, OpenOrderRequest, OrderRef,
    StakeRef, StakeTokenRequest,
};
use triad_client::config::LoggingConfig;
use triad_client::metrics::metrics;
use triad_client::state::{parse_units, OrderDirection, Rarity, WinningDirection, CANONICAL_DECIMALS};
use triad_client::wallet::WalletManager;
use triad_client::{Config, OperationOutcome, RpcOptions, TriadClient};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file; environment overrides apply either way
    #[arg(short, long, env = "TRIAD_CONFIG")]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Compute-unit price in micro-lamports, overriding the configuration
    #[arg(long)]
    priority_fee: Option<u64>,

    /// Submit without preflight simulation
    #[arg(long)]
    skip_preflight: bool,

    /// Print Prometheus metrics to stderr after the command
    #[arg(long)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every market of both layouts
    Markets,
    /// Show one market by id or address
    Market {
        #[arg(required_unless_present = "address")]
        market_id: Option<u64>,
        #[arg(long, conflicts_with = "market_id")]
        address: Option<Pubkey>,
    },
    /// Show the trade ledger of a wallet (default: own wallet)
    UserTrade { wallet: Option<Pubkey> },
    /// Show the user account of a wallet (default: own wallet)
    User { wallet: Option<Pubkey> },
    /// List all users, most referrals first
    Users,
    /// Check whether a wallet has a user account
    HasUser { wallet: Pubkey },
    /// Look up the wallet registered under a user name
    Referral { name: String },
    /// Show a stake vault
    StakeVault { name: String },
    /// List the stakes of a wallet (default: own wallet)
    Stakes { wallet: Option<Pubkey> },
    /// List vault positions that still hold a balance (default: own wallet)
    Positions {
        wallet: Option<Pubkey>,
        /// Position ticker, repeatable (default: canonical mint)
        #[arg(long = "ticker")]
        tickers: Vec<Pubkey>,
    },

    /// Open an order, swapping from another token when needed
    OpenOrder {
        market_id: u64,
        /// Decimal amount of the paying token
        amount: String,
        #[arg(value_enum)]
        direction: Direction,
        /// Paying token (default: canonical mint)
        #[arg(long)]
        token: Option<Pubkey>,
        /// Decimals of the paying token
        #[arg(long, default_value_t = CANONICAL_DECIMALS)]
        token_decimals: u8,
        #[arg(long)]
        comment: Option<String>,
    },
    CloseOrder { market_id: u64, order_id: u64 },
    SettleOrder { market_id: u64, order_id: u64 },
    PayoutOrder { market_id: u64, order_id: u64 },
    AddLiquidity {
        market_id: u64,
        /// Decimal canonical amount
        amount: String,
        #[arg(value_enum)]
        direction: Direction,
    },
    /// Collect accrued fees and settle them into `vault`
    CollectFee { market_id: u64, vault: Pubkey },
    InitializeMarket {
        market_id: u64,
        name: String,
        question: String,
        /// Unix seconds
        start_time: i64,
        /// Unix seconds
        end_time: i64,
    },
    ResolveMarket {
        market_id: u64,
        #[arg(value_enum)]
        winner: Direction,
    },
    CreateUser { name: String, referral: Pubkey },
    StakeToken {
        stake_vault: String,
        name: String,
        /// Decimal canonical amount
        amount: String,
    },
    RequestWithdrawStake { stake_vault: String, name: String },
    WithdrawStake { stake_vault: String, name: String },
    /// Claim rewards co-signed by the verifier keypair
    ClaimStakeRewards {
        stake_vault: String,
        name: String,
        rank: u16,
        collections: u8,
        /// Verifier keypair file (default: wallet.verifier_keypair_path)
        #[arg(long)]
        verifier: Option<String>,
    },
    /// Create a ticket collection under a fresh core collection key
    CreateCollection { name: String, symbol: String, supply: u64 },
    /// Exchange a pass NFT for a ticket, co-signed by the verifier keypair
    MintTicket {
        collection_symbol: String,
        number: u64,
        nft_mint: Pubkey,
        /// Percent off the tier price
        #[arg(long, default_value_t = 0)]
        discount: u64,
        #[arg(long)]
        boosted: bool,
        #[arg(long, value_enum, default_value = "common")]
        rarity: TicketRarity,
        /// Verifier keypair file (default: wallet.verifier_keypair_path)
        #[arg(long)]
        verifier: Option<String>,
    },
}

impl Command {
    fn is_read_only(&self) -> bool {
        matches!(
            self,
            Command::Markets
                | Command::Market { .. }
                | Command::UserTrade { wallet: Some(_) }
                | Command::User { wallet: Some(_) }
                | Command::Users
                | Command::HasUser { .. }
                | Command::Referral { .. }
                | Command::StakeVault { .. }
                | Command::Stakes { wallet: Some(_) }
                | Command::Positions { wallet: Some(_), .. }
        )
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Direction {
    Hype,
    Flop,
}

impl From<Direction> for OrderDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Hype => OrderDirection::Hype,
            Direction::Flop => OrderDirection::Flop,
        }
    }
}

impl From<Direction> for WinningDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Hype => WinningDirection::Hype,
            Direction::Flop => WinningDirection::Flop,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TicketRarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl From<TicketRarity> for Rarity {
    fn from(rarity: TicketRarity) -> Self {
        match rarity {
            TicketRarity::Common => Rarity::Common,
            TicketRarity::Uncommon => Rarity::Uncommon,
            TicketRarity::Rare => Rarity::Rare,
            TicketRarity::Epic => Rarity::Epic,
            TicketRarity::Legendary => Rarity::Legendary,
            TicketRarity::Mythic => Rarity::Mythic,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    init_logging(&config.logging, args.verbose, args.json_logs)?;
    debug!(rpc = %config.rpc.url, swap = %config.swap.base_url, "Configuration loaded");

    // Reads of another wallet need no key material.
    let wallet = if args.command.is_read_only() {
        WalletManager::from_keypair(Keypair::new())
    } else {
        WalletManager::from_file(&config.wallet.keypair_path).context("Failed to load wallet")?
    };
    let client = TriadClient::from_config(&config, &wallet)?;

    let options = RpcOptions {
        skip_preflight: args.skip_preflight || config.transaction.skip_preflight,
        priority_fee_micro_lamports: args
            .priority_fee
            .or(config.transaction.priority_fee_micro_lamports),
    };

    let output = run(&client, &config, args.command, options).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    if args.print_metrics {
        eprintln!("{}", metrics().gather_text()?);
    }
    Ok(())
}

/// Initialize logging subsystem
fn init_logging(logging: &LoggingConfig, verbose: bool, json_logs: bool) -> Result<()> {
    let default_filter = if verbose {
        "triad=debug,triad_client=debug,info".to_string()
    } else {
        logging.level.clone()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter);
    if json_logs || logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}

fn signature_output(signature: impl ToString) -> Value {
    json!({ "status": "submitted", "signature": signature.to_string() })
}

fn outcome_output<T>(outcome: OperationOutcome<T>, submitted: impl FnOnce(T) -> Value) -> Value {
    match outcome {
        OperationOutcome::Submitted(value) => submitted(value),
        OperationOutcome::NoOp(reason) => json!({
            "status": "noop",
            "reason": reason.as_str(),
            "detail": reason.to_string(),
        }),
    }
}

fn load_verifier(path: Option<String>, config: &Config) -> Result<WalletManager> {
    let path = path
        .or_else(|| config.wallet.verifier_keypair_path.clone())
        .context("No verifier keypair: pass --verifier or set wallet.verifier_keypair_path")?;
    WalletManager::from_file(&path).context("Failed to load verifier keypair")
}

async fn run(client: &TriadClient, config: &Config, command: Command, options: RpcOptions) -> Result<Value> {
    let me = client.authority();
    let canonical = |amount: &str| parse_units(amount, CANONICAL_DECIMALS);

    let output = match command {
        Command::Markets => serde_json::to_value(client.get_all_markets().await?)?,
        Command::Market { market_id, address } => {
            let market = match (market_id, address) {
                (_, Some(address)) => client.get_market_by_address(&address).await?,
                (Some(id), None) => client.get_market_by_id(id).await?,
                (None, None) => anyhow::bail!("either a market id or --address is required"),
            };
            serde_json::to_value(market)?
        }
        Command::UserTrade { wallet } => {
            serde_json::to_value(client.get_user_trade(&wallet.unwrap_or(me)).await?)?
        }
        Command::User { wallet } => serde_json::to_value(client.get_user(&wallet.unwrap_or(me)).await?)?,
        Command::Users => serde_json::to_value(client.get_users().await?)?,
        Command::HasUser { wallet } => json!({ "wallet": wallet.to_string(), "hasUser": client.has_user(&wallet).await? }),
        Command::Referral { name } => {
            let referral = client.get_referral(&name).await?;
            json!({ "name": name, "referral": referral.map(|key| key.to_string()) })
        }
        Command::StakeVault { name } => serde_json::to_value(client.get_stake_vault(&name).await?)?,
        Command::Stakes { wallet } => {
            serde_json::to_value(client.get_stakes_by_wallet(&wallet.unwrap_or(me)).await?)?
        }
        Command::Positions { wallet, mut tickers } => {
            if tickers.is_empty() {
                tickers.push(client.addresses().canonical_mint);
            }
            let positions = client
                .get_user_positions_with_amount(&wallet.unwrap_or(me), &tickers)
                .await?;
            serde_json::to_value(positions)?
        }

        Command::OpenOrder {
            market_id,
            amount,
            direction,
            token,
            token_decimals,
            comment,
        } => {
            let request = OpenOrderRequest {
                market_id,
                amount: parse_units(&amount, token_decimals)?,
                direction: direction.into(),
                token: token.unwrap_or(client.addresses().canonical_mint),
                comment,
            };
            info!(market_id, amount = request.amount, token = %request.token, "Opening order");
            outcome_output(client.open_order(request, options).await?, signature_output)
        }
        Command::CloseOrder { market_id, order_id } => {
            signature_output(client.close_order(OrderRef { market_id, order_id }, options).await?)
        }
        Command::SettleOrder { market_id, order_id } => {
            signature_output(client.settle_order(OrderRef { market_id, order_id }, options).await?)
        }
        Command::PayoutOrder { market_id, order_id } => {
            signature_output(client.payout_order(OrderRef { market_id, order_id }, options).await?)
        }
        Command::AddLiquidity {
            market_id,
            amount,
            direction,
        } => {
            let request = AddLiquidityRequest {
                market_id,
                amount: canonical(&amount)?,
                direction: direction.into(),
            };
            signature_output(client.add_liquidity(request, options).await?)
        }
        Command::CollectFee { market_id, vault } => {
            let outcome = client.collect_fee(CollectFeeRequest { market_id, vault }, options).await?;
            outcome_output(outcome, |receipt| {
                json!({
                    "status": "submitted",
                    "signature": receipt.signature.to_string(),
                    "feeToSwap": receipt.fee_to_swap.to_string(),
                    "lamports": receipt.lamports.to_string(),
                })
            })
        }
        Command::InitializeMarket {
            market_id,
            name,
            question,
            start_time,
            end_time,
        } => {
            let request = InitializeMarketRequest {
                market_id,
                name,
                question,
                start_time,
                end_time,
            };
            signature_output(client.initialize_market(request, options).await?)
        }
        Command::ResolveMarket { market_id, winner } => {
            signature_output(client.resolve_market(market_id, winner.into(), options).await?)
        }
        Command::CreateUser { name, referral } => {
            signature_output(client.create_user(CreateUserRequest { name, referral }, options).await?)
        }
        Command::StakeToken {
            stake_vault,
            name,
            amount,
        } => {
            let request = StakeTokenRequest {
                stake_vault,
                name,
                amount: canonical(&amount)?,
            };
            signature_output(client.stake_token(request, options).await?)
        }
        Command::RequestWithdrawStake { stake_vault, name } => signature_output(
            client
                .request_withdraw_stake(StakeRef { stake_vault, name }, options)
                .await?,
        ),
        Command::WithdrawStake { stake_vault, name } => {
            signature_output(client.withdraw_stake(StakeRef { stake_vault, name }, options).await?)
        }
        Command::ClaimStakeRewards {
            stake_vault,
            name,
            rank,
            collections,
            verifier,
        } => {
            let verifier = load_verifier(verifier, config)?;
            let request = ClaimStakeRewardsRequest {
                stake: StakeRef { stake_vault, name },
                rank,
                collections,
            };
            signature_output(
                client
                    .claim_stake_rewards(request, verifier.keypair(), options)
                    .await?,
            )
        }
        Command::CreateCollection { name, symbol, supply } => {
            let receipt = client
                .create_collection(CreateCollectionRequest { name, symbol, supply }, options)
                .await?;
            json!({
                "status": "submitted",
                "signature": receipt.signature.to_string(),
                "coreCollection": receipt.core_collection.to_string(),
            })
        }
        Command::MintTicket {
            collection_symbol,
            number,
            nft_mint,
            discount,
            boosted,
            rarity,
            verifier,
        } => {
            let verifier = load_verifier(verifier, config)?;
            let request = MintTicketRequest {
                collection_symbol,
                number,
                discount,
                is_boosted: boosted,
                rarity: rarity.into(),
                nft_mint,
            };
            let receipt = client.mint_ticket(request, verifier.keypair(), options).await?;
            json!({
                "status": "submitted",
                "signature": receipt.signature.to_string(),
                "asset": receipt.asset.to_string(),
            })
        }
    };
    Ok(output)
}
