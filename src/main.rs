mod analysis;
mod config;
mod error;
mod export;
mod indicator;
mod model;
mod observer;
mod provider;
mod series;
mod strategy;
mod trend;

use std::fs::File;
use std::io;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

use analysis::{Analysis, analyze};
use config::AppConfig;
use export::{ExportFormat, export_signals};
use model::Interval;
use observer::log::LogObserver;
use provider::yahoo::YahooProvider;
use provider::{MarketDataProvider, SeriesRequest};
use series::IndicatorParams;

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("market data error")]
    Provider,
    #[display("analysis error")]
    Analysis,
    #[display("export error")]
    Export,
}

#[derive(Parser)]
#[command(
    name = "forex-signals",
    about = "Indicator-driven trading signals for currency pairs"
)]
struct Cli {
    /// Path to the TOML configuration file (config.toml is read when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the trend verdict and the latest signals
    Analyze {
        #[command(flatten)]
        market: MarketArgs,
        /// Print the prepared series, signals and trend as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the latest signals as CSV or JSON
    Export {
        #[command(flatten)]
        market: MarketArgs,
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Overrides for the `[market]` config section.
#[derive(Args)]
struct MarketArgs {
    /// Quote symbol, e.g. EURUSD=X
    #[arg(long)]
    symbol: Option<String>,
    /// Lookback period, e.g. 180d or 1y
    #[arg(long)]
    period: Option<String>,
    /// Bar interval: 1d, 1wk or 1mo
    #[arg(long)]
    interval: Option<String>,
}

impl MarketArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(symbol) = &self.symbol {
            config.market.symbol = symbol.clone();
        }
        if let Some(period) = &self.period {
            config.market.period = period.clone();
        }
        if let Some(interval) = &self.interval {
            config.market.interval = interval.clone();
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let mut config = config::load(cli.config.as_deref()).change_context(AppError::Config)?;

    let market_args = match &cli.command {
        Command::Analyze { market, .. } | Command::Export { market, .. } => market,
    };
    market_args.apply(&mut config);
    config::validate(&config).change_context(AppError::Config)?;

    init_tracing(&config);

    let analysis = fetch_and_analyze(&config).await?;

    match cli.command {
        Command::Analyze { json: true, .. } => {
            serde_json::to_writer_pretty(io::stdout().lock(), &analysis)
                .change_context(AppError::Export)?;
            println!();
        }
        Command::Analyze { .. } => print_analysis(&config, &analysis),
        Command::Export { format, output, .. } => {
            match &output {
                Some(path) => {
                    let file = File::create(path)
                        .change_context(AppError::Export)
                        .attach_with(|| format!("path: {}", path.display()))?;
                    export_signals(&analysis.signals, format, file)
                        .change_context(AppError::Export)?;
                }
                None => {
                    export_signals(&analysis.signals, format, io::stdout().lock())
                        .change_context(AppError::Export)?;
                }
            }
            info!(
                rows = analysis.signals.len(),
                format = ?format,
                output = ?output,
                "signals exported"
            );
        }
    }

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    // stdout is reserved for command output
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
}

async fn fetch_and_analyze(config: &AppConfig) -> Result<Analysis, Report<AppError>> {
    let market = &config.market;
    let interval = Interval::parse(&market.interval).ok_or_else(|| {
        Report::new(AppError::Config).attach(format!("interval: {}", market.interval))
    })?;
    let request = SeriesRequest {
        symbol: market.symbol.clone(),
        period: market.period.clone(),
        interval,
    };

    let provider = YahooProvider::new(&market.base_url, market.timeout())
        .change_context(AppError::Provider)?;

    info!(
        provider = provider.name(),
        symbol = %request.symbol,
        period = %request.period,
        interval = %request.interval,
        "fetching price series"
    );

    let raw = provider
        .fetch_series(&request)
        .await
        .change_context(AppError::Provider)?;

    let params = IndicatorParams::from(&config.indicators);
    analyze(&raw, &params, &LogObserver)
        .change_context(AppError::Analysis)
        .attach_with(|| format!("symbol: {}", request.symbol))
}

fn print_analysis(config: &AppConfig, analysis: &Analysis) {
    println!(
        "{} ({}, {})",
        config.market.symbol, config.market.period, config.market.interval
    );
    println!(
        "Prediction : {} [{}]",
        analysis.trend.text, analysis.trend.color
    );

    if analysis.series.is_empty() {
        println!("Not enough history for full indicator coverage.");
    }

    if let Some(last) = analysis.series.bars().last() {
        let ind = &last.indicators;
        println!(
            "Last bar {} close {:.4} | BB {:.4}/{:.4}/{:.4} | %K {:.2} %D {:.2} | OBV {:.0} | cloud {:.4}/{:.4}",
            last.bar.date,
            last.bar.close,
            ind.bb_lower,
            ind.bb_middle,
            ind.bb_upper,
            ind.stoch_k,
            ind.stoch_d,
            ind.obv,
            ind.ichimoku_a,
            ind.ichimoku_b,
        );
    }

    if analysis.signals.is_empty() {
        println!("No signals.");
        return;
    }

    println!();
    println!("{:<12}{:>12}  Signal", "Date", "Close");
    for signal in &analysis.signals {
        println!(
            "{:<12}{:>12.4}  {}",
            signal.date.format("%Y-%m-%d").to_string(),
            signal.close,
            signal.label
        );
    }
}
