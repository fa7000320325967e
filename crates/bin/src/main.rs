//! Tangency CLI binary.
//!
//! Finds the maximum Sharpe ratio portfolio for a basket of tickers and
//! reports its risk.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tangency::{EngineConfig, PortfolioAnalysis, analyze};
use tangency_data::{CsvPriceSource, PriceSource, YahooPriceSource};
use tangency_output::{ExportFormat, PortfolioReport, ReportBuilder, export_report_files};
use tangency_risk::{PriceSeries, RateGrid};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tangency")]
#[command(about = "Tangency: Sharpe-optimal allocation and historical risk", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize the portfolio and report its risk
    Analyze {
        #[command(flatten)]
        engine: EngineArgs,

        /// Also report the Sharpe ratio at this risk-free rate
        #[arg(long)]
        adjusted_rate: Option<f64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Sharpe ratio across a range of risk-free rates
    Sensitivity {
        #[command(flatten)]
        engine: EngineArgs,

        /// Lowest risk-free rate
        #[arg(long)]
        min: Option<f64>,

        /// Highest risk-free rate
        #[arg(long)]
        max: Option<f64>,

        /// Spacing between rates
        #[arg(long)]
        step: Option<f64>,

        /// Re-optimize the weights at every rate
        #[arg(long)]
        reoptimize: bool,

        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Data and analysis parameters, each overriding the config file
#[derive(Args)]
struct EngineArgs {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma-separated ticker symbols
    #[arg(long, value_delimiter = ',')]
    tickers: Option<Vec<String>>,

    /// First date (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last date (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Wide CSV price file instead of Yahoo Finance
    #[arg(long)]
    prices: Option<PathBuf>,

    /// Annual risk-free rate as a decimal
    #[arg(long)]
    risk_free_rate: Option<f64>,

    /// VaR lower-tail probability
    #[arg(long)]
    confidence: Option<f64>,

    /// Periods per year
    #[arg(long)]
    annualization_factor: Option<f64>,

    /// Optimizer iteration cap
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Use uniform weights if the optimizer fails
    #[arg(long)]
    fallback_uniform: bool,
}

#[derive(Args)]
struct OutputArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Write report, holdings, cumulative curve and VaR files into this directory
    #[arg(long)]
    export: Option<PathBuf>,

    /// Format of exported files (csv, json, pretty-json)
    #[arg(long, default_value = "csv")]
    export_format: ExportFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl EngineArgs {
    fn into_config(self) -> tangency::Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_json_file(path)?,
            None => EngineConfig::default(),
        };

        if let Some(tickers) = self.tickers {
            config.assets = tickers;
        }
        if let Some(start) = self.start {
            config.start = start;
        }
        if let Some(end) = self.end {
            config.end = end;
        }
        if self.prices.is_some() {
            config.prices = self.prices;
        }
        if let Some(rate) = self.risk_free_rate {
            config.analysis.risk_free_rate = rate;
        }
        if let Some(level) = self.confidence {
            config.analysis.confidence_level = level;
        }
        if let Some(factor) = self.annualization_factor {
            config.analysis.annualization_factor = factor;
        }
        if let Some(cap) = self.max_iterations {
            config.analysis.optimizer.max_iterations = cap;
        }
        config.analysis.fallback_uniform |= self.fallback_uniform;

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Analyze {
            engine,
            adjusted_rate,
            output,
        } => {
            let config = engine.into_config()?;
            let analysis = analyze(&load_prices(&config).await?, &config.analysis)?;

            let mut builder = analysis.report();
            if let Some(rate) = adjusted_rate {
                builder = builder.adjusted(&analysis.adjusted(rate)?);
            }
            emit(builder, &output)?;
        }
        Commands::Sensitivity {
            engine,
            min,
            max,
            step,
            reoptimize,
            output,
        } => {
            let config = engine.into_config()?;
            let defaults = config.analysis.sensitivity;
            let rates = RateGrid {
                start: min.unwrap_or(defaults.start),
                end: max.unwrap_or(defaults.end),
                step: step.unwrap_or(defaults.step),
            }
            .rates()?;

            let analysis = analyze(&load_prices(&config).await?, &config.analysis)?;
            let builder = sensitivity_report(&analysis, &config, &rates, reoptimize)?;
            emit(builder, &output)?;
        }
    }

    Ok(())
}

fn sensitivity_report(
    analysis: &PortfolioAnalysis,
    config: &EngineConfig,
    rates: &[f64],
    reoptimize: bool,
) -> Result<ReportBuilder, Box<dyn std::error::Error>> {
    let builder = analysis.report();
    if reoptimize {
        let optimizer = config.analysis.sharpe_optimizer()?;
        info!(scenarios = rates.len(), "re-optimizing across risk-free rates");
        let points = analysis.reoptimized(&optimizer, rates);
        Ok(builder.sensitivity(&points))
    } else {
        let points = analysis.sensitivity(rates)?;
        Ok(builder.sensitivity(&points))
    }
}

/// Load prices from the configured CSV file or from Yahoo Finance.
async fn load_prices(config: &EngineConfig) -> Result<PriceSeries, Box<dyn std::error::Error>> {
    let request = config.request()?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));

    let prices = match &config.prices {
        Some(path) => {
            pb.set_message(format!("Reading {}", path.display()));
            fetch_with(&CsvPriceSource::new(path), &request, &pb).await
        }
        None => {
            pb.set_message(format!(
                "Fetching {} symbols from Yahoo Finance",
                request.symbols().len()
            ));
            fetch_with(&YahooPriceSource::try_new()?, &request, &pb).await
        }
    };

    pb.finish_and_clear();
    let prices = prices?;
    info!(
        dates = prices.n_dates(),
        assets = prices.n_assets(),
        "prices ready"
    );
    Ok(prices)
}

async fn fetch_with<S: PriceSource>(
    source: &S,
    request: &tangency_data::PriceRequest,
    pb: &ProgressBar,
) -> tangency_data::Result<PriceSeries> {
    let prices = source.fetch_prices(request).await?;
    pb.set_message(format!("Loaded {} dates", prices.n_dates()));
    Ok(prices)
}

fn emit(builder: ReportBuilder, output: &OutputArgs) -> Result<(), Box<dyn std::error::Error>> {
    let report: PortfolioReport = builder.build()?;

    match output.format {
        OutputFormat::Text => println!("{}", report.to_ascii_table()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    if let Some(dir) = &output.export {
        for path in export_report_files(&report, dir, output.export_format)? {
            eprintln!("Wrote {}", path.display());
        }
    }

    Ok(())
}
