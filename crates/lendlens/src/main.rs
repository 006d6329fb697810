#![expect(
    clippy::multiple_crate_versions,
    reason = "transitive dependency duplication"
)]

use alloy::{
    primitives::{Address, U256},
    rpc::types::TransactionRequest,
};
use clap::{Parser, Subcommand, ValueEnum};
use eyre::Context as _;
use serde_json::json;
use tracing_subscriber::prelude::*;

use lendlens::{
    amount,
    chains::evm::EvmChain,
    cli_output,
    config::LensConfig,
    errors::LensError,
    market::{
        actions,
        calc::{self, RateConstants},
        checks,
        reader::ChainReader as _,
        refresh::refresh,
        resolver::NATIVE_DECIMALS,
        summary::AccountSummary,
    },
    paths::{LensPaths, LOG_FILE_NAME},
    rate_math,
    store::ConfigStore,
};

#[derive(Parser, Debug)]
#[command(name = "lendlens", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TxAction {
    Supply,
    Withdraw,
    Borrow,
    Repay,
    Approve,
    Enter,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read every market for an account and print the views, failures and account totals.
    Markets {
        /// Network name from config.toml.
        #[arg(long, default_value = "ethereum")]
        chain: String,
        #[arg(long)]
        account: Address,
        /// Restrict to these markets (repeatable). Defaults to the configured or listed markets.
        #[arg(long = "market")]
        markets: Vec<Address>,
    },

    /// Annualize a per-block rate (no network access).
    Apy {
        /// Mantissa-scaled rate per block, as returned by `supplyRatePerBlock()`.
        #[arg(long)]
        rate_per_block: U256,
        /// Underlying token decimals; the APY is returned at `36 - decimals` places.
        #[arg(long, default_value_t = 18)]
        decimals: u8,
        /// Seconds per block. Defaults to `calculator.block_time_seconds`.
        #[arg(long, value_parser = calc::parse_block_time)]
        block_time: Option<f64>,
    },

    /// Print an unsigned transaction for a market action.
    Tx {
        #[arg(value_enum)]
        action: TxAction,
        #[arg(long, default_value = "ethereum")]
        chain: String,
        #[arg(long)]
        account: Address,
        #[arg(long)]
        market: Address,
        /// Amount in underlying units (e.g. "1.5").
        #[arg(long)]
        amount: Option<String>,
        /// Repay the whole borrow balance.
        #[arg(long, default_value_t = false)]
        full: bool,
        /// Treat the market as the native-coin market.
        #[arg(long, default_value_t = false)]
        native: bool,
        /// Underlying decimals; read from the token when omitted.
        #[arg(long)]
        decimals: Option<u8>,
    },

    /// Print resolved paths (useful for debugging).
    Paths,
}

/// JSON events to stderr and to the data-dir log file, both filtered by `RUST_LOG`.
fn init_logging(paths: &LensPaths) -> tracing_appender::non_blocking::WorkerGuard {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let (file_writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        &paths.data_dir,
        LOG_FILE_NAME,
    ));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_filter(filter.clone()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(file_writer)
                .with_filter(filter),
        )
        .init();

    guard
}

async fn run_markets(
    cfg: &LensConfig,
    chain: &str,
    account: Address,
    only: &[Address],
) -> eyre::Result<()> {
    let network = cfg.network(chain)?;
    let evm = EvmChain::for_network(chain, network)?;
    let outcome = refresh(&evm, cfg, chain, account, only).await?;

    let views = outcome.views();
    let summary = AccountSummary::from_markets(views.iter().copied())?;
    let markets: Vec<_> = views
        .iter()
        .map(|v| {
            let mut j = v.to_json();
            j["max_borrow"] = json!(checks::max_borrow(v, &summary).to_string());
            j
        })
        .collect();
    let failures: Vec<_> = outcome
        .failures()
        .into_iter()
        .map(|(m, e)| json!({ "market": format!("{m:#x}"), "error": e }))
        .collect();

    cli_output::print_failed_markets(failures.len(), outcome.markets.len());
    cli_output::print_json(&json!({
        "chain": chain,
        "account": format!("{account:#x}"),
        "comptroller": format!("{:#x}", outcome.ctx.comptroller),
        "oracle": format!("{:#x}", outcome.ctx.oracle),
        "markets": markets,
        "failures": failures,
        "summary": summary.to_json(),
    }))
}

fn run_apy(
    cfg: &LensConfig,
    rate_per_block: U256,
    decimals: u8,
    block_time: Option<f64>,
) -> eyre::Result<()> {
    let rates = RateConstants {
        block_time_secs: block_time.unwrap_or(cfg.calculator.block_time_seconds),
        days_per_year: cfg.calculator.days_per_year,
        ..RateConstants::default()
    };
    let apy = calc::annual_yield(rate_per_block, decimals, &rates)?;
    let places = calc::apy_decimals(decimals)?;
    cli_output::print_json(&json!({
        "rate_per_block": rate_per_block.to_string(),
        "decimals": decimals,
        "block_time_seconds": rates.block_time_secs,
        "blocks_per_day": rate_math::blocks_per_day(rates.block_time_secs),
        "days_per_year": rates.days_per_year,
        "apy": apy.to_string(),
        "apy_decimals": places,
        "apy_ui": amount::format_base_to_ui(apy, places),
    }))
}

struct TxArgs {
    action: TxAction,
    chain: String,
    account: Address,
    market: Address,
    amount: Option<String>,
    full: bool,
    native: bool,
    decimals: Option<u8>,
}

async fn run_tx(cfg: &LensConfig, args: TxArgs) -> eyre::Result<()> {
    let network = cfg.network(&args.chain)?;
    let (from, market) = (args.account, args.market);
    let is_native = args.native || network.native_market == Some(market);
    let evm = EvmChain::for_network(&args.chain, network)?;

    let tx = if args.action == TxAction::Enter {
        let comptroller = network
            .comptroller
            .ok_or_else(|| LensError::MissingComptroller(args.chain.clone()))?;
        actions::enter_market(from, comptroller, market)
    } else {
        token_action(&evm, &args, is_native).await?
    };

    let action = args
        .action
        .to_possible_value()
        .map(|v| v.get_name().to_owned());
    let mut out = actions::tx_json(&tx);
    out["action"] = json!(action);
    out["chain_id"] = json!(network.chain_id);
    cli_output::print_json(&out)
}

async fn token_action(
    evm: &EvmChain,
    args: &TxArgs,
    is_native: bool,
) -> eyre::Result<TransactionRequest> {
    let (from, market) = (args.account, args.market);

    let underlying = if is_native {
        None
    } else {
        Some(
            evm.underlying(args.market)
                .await
                .with_context(|| format!("read underlying() of market {:#x}", args.market))?,
        )
    };
    let decimals = match (args.decimals, underlying) {
        (Some(d), _) => d,
        (None, None) => NATIVE_DECIMALS,
        (None, Some(token)) => evm
            .decimals(token)
            .await
            .with_context(|| format!("read decimals() of {token:#x}"))?,
    };
    let amount = match args.amount.as_deref() {
        Some(s) => checks::parse_amount(s, decimals).map_err(|e| eyre::eyre!("{e}"))?,
        None => None,
    };
    let required = || amount.ok_or_else(|| eyre::eyre!("--amount is required for this action"));

    Ok(match args.action {
        TxAction::Supply => actions::supply(from, market, required()?, is_native),
        TxAction::Withdraw => actions::withdraw(from, market, required()?),
        TxAction::Borrow => actions::borrow(from, market, required()?),
        TxAction::Repay if args.full && !is_native => {
            actions::repay(from, market, U256::MAX, true, false)
        }
        TxAction::Repay => actions::repay(from, market, required()?, args.full, is_native),
        TxAction::Approve => actions::approve(from, underlying, market, amount)?,
        TxAction::Enter => eyre::bail!("enter takes no token amount"),
    })
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let paths = LensPaths::discover()?;
    paths.ensure_private_dirs().context("create lendlens dirs")?;
    let _log_guard = init_logging(&paths);

    match cli.cmd {
        Command::Paths => cli_output::print_json(&json!({
          "config_dir": paths.config_dir,
          "data_dir": paths.data_dir,
          "config_file": paths.config_file(),
          "log_file": paths.log_file,
        })),
        Command::Markets {
            chain,
            account,
            markets,
        } => {
            let cfg = ConfigStore::new(&paths).load_or_init_default()?;
            run_markets(&cfg, &chain, account, &markets).await
        }
        Command::Apy {
            rate_per_block,
            decimals,
            block_time,
        } => {
            let cfg = ConfigStore::new(&paths).load_or_init_default()?;
            run_apy(&cfg, rate_per_block, decimals, block_time)
        }
        Command::Tx {
            action,
            chain,
            account,
            market,
            amount,
            full,
            native,
            decimals,
        } => {
            let cfg = ConfigStore::new(&paths).load_or_init_default()?;
            run_tx(
                &cfg,
                TxArgs {
                    action,
                    chain,
                    account,
                    market,
                    amount,
                    full,
                    native,
                    decimals,
                },
            )
            .await
        }
    }
}
