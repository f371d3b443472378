use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use supplyscan::{
    analysis::{AnalysisContext, AnalysisResult, TeamSupplyAnalyzer},
    arguments::{self, get_enabled_debug_modes},
    config,
    logger::{self, LogTag},
    rpc::RpcClient,
    AnalysisError, CancellationToken,
};

/// Estimate how much of a token's supply is held by team wallets
#[derive(Parser, Debug)]
#[command(name = "supplyscan", version, after_help = arguments::logger_flags_help())]
struct Cli {
    /// Token mint address
    token_address: String,

    /// Configuration file (TOML)
    #[arg(long, default_value = config::CONFIG_FILE_PATH)]
    config: String,

    /// Cancel the analysis after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Write the JSON result to this file instead of stdout
    #[arg(long)]
    output: Option<String>,

    /// Show verbose output for every module
    #[arg(long)]
    verbose: bool,
}

const EXIT_FAILURE: u8 = 1;
const EXIT_CANCELLED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_from(arguments::clap_args());

    logger::init();

    if cli.verbose {
        logger::verbose(LogTag::System, &format!("Arguments: {:?}", cli));
    }

    let debug_modes = get_enabled_debug_modes();
    if !debug_modes.is_empty() {
        logger::info(
            LogTag::System,
            &format!("Debug modes enabled: {}", debug_modes.join(", ")),
        );
    }

    let code = match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<AnalysisError>() {
            Some(err) if err.is_cancelled() => {
                logger::warning(LogTag::System, &format!("Cancelled: {}", err));
                ExitCode::from(EXIT_CANCELLED)
            }
            _ => {
                logger::error(LogTag::System, &format!("{:#}", e));
                ExitCode::from(EXIT_FAILURE)
            }
        },
    };

    logger::flush();
    code
}

async fn run(cli: &Cli) -> Result<()> {
    config::load_config_from_path(&cli.config)
        .map_err(AnalysisError::Config)
        .context("Failed to load configuration")?;
    let cfg = config::get_config_clone();

    let cancel = CancellationToken::new();
    install_cancel_handlers(&cancel, cli.timeout_secs)?;

    let client = Arc::new(RpcClient::from_config(&cfg).context("Failed to create RPC client")?);
    let analyzer = TeamSupplyAnalyzer::from_rpc(client.clone(), &cfg);

    logger::info(
        LogTag::System,
        &format!("Analyzing {} via {}", cli.token_address, client.url()),
    );

    let context = AnalysisContext::new("teamSupply", "cli");
    let result = analyzer
        .analyze_team_supply(&cli.token_address, &context, &cancel)
        .await?;

    let stats = client.gate().stats();
    logger::debug(
        LogTag::RateLimit,
        &format!(
            "{} requests, {} paced, peak concurrency {}",
            stats.total_requests, stats.paced_requests, stats.max_in_flight
        ),
    );

    print_summary(&result);
    write_result(&result, cli.output.as_deref()).await
}

/// Ctrl+C and the optional `--timeout-secs` budget both flip the same token
fn install_cancel_handlers(cancel: &CancellationToken, timeout_secs: Option<u64>) -> Result<()> {
    let on_signal = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\n🛑 Received Ctrl+C, cancelling analysis...");
        on_signal.cancel();
    })
    .context("Failed to install Ctrl+C handler")?;

    if let Some(secs) = timeout_secs {
        let on_timeout = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            logger::warning(
                LogTag::System,
                &format!("Time budget of {}s exhausted, cancelling analysis", secs),
            );
            on_timeout.cancel();
        });
    }

    Ok(())
}

fn print_summary(result: &AnalysisResult) {
    let scan = &result.scan_data;
    logger::info(
        LogTag::System,
        &format!(
            "{} ({}): {}% of supply controlled by {} team wallets ({} analyzed)",
            scan.token_info.symbol,
            scan.token_address,
            scan.total_supply_controlled,
            scan.team_wallets.len(),
            scan.analyzed_wallets.len()
        ),
    );
}

async fn write_result(result: &AnalysisResult, output: Option<&str>) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("Failed to serialize result")?;

    match output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write result to {}", path))?;
            logger::info(LogTag::System, &format!("Result written to {}", path));
        }
        None => println!("{}", json),
    }
    Ok(())
}
