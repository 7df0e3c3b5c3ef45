//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{Backtest, BacktestConfig};
use crate::domain::config_validation::{build_backtest_config, configured_spec};
use crate::domain::drawdown::Target;
use crate::domain::error::StancetraderError;
use crate::domain::portfolio::{self, AggregationPolicy};
use crate::domain::strategy::parse_spec;
use crate::domain::summary;
use crate::domain::trades::TradeRecord;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "stancetrader", about = "Stance-driven strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single-strategy backtest
    Backtest {
        /// CSV price file (date,last[,high,low,volume])
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Strategy spec, e.g. ma:5,20 or mastop:1,10,0.05:trailing
        #[arg(short, long)]
        strategy: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Per-unit transaction cost (overrides config)
        #[arg(long)]
        slippage: Option<f64>,
        #[arg(long)]
        long_only: bool,
        /// Drawdown recursion depth (overrides config)
        #[arg(long)]
        depth: Option<usize>,
        /// Minimum drawdown depth to report, percent (overrides config)
        #[arg(long)]
        cutoff: Option<f64>,
        /// Also show drawdowns of the market curve
        #[arg(long)]
        market_drawdowns: bool,
    },
    /// Run several strategies over one price file and aggregate them
    Portfolio {
        #[arg(short, long)]
        data: PathBuf,
        /// Strategy spec, repeatable
        #[arg(short, long, required = true)]
        strategy: Vec<String>,
        /// Comma-separated weights, e.g. 3,1 (default equal)
        #[arg(short, long)]
        weights: Option<String>,
        /// Collapse the weighted stance to its sign (majority vote)
        #[arg(long)]
        vote: bool,
        #[arg(long)]
        slippage: Option<f64>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Show the date range of a price file
    Info {
        #[arg(short, long)]
        data: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            data,
            config,
            strategy,
            start,
            end,
            slippage,
            long_only,
            depth,
            cutoff,
            market_drawdowns,
        } => run_backtest(
            &data,
            config.as_ref(),
            strategy.as_deref(),
            start,
            end,
            BacktestOverrides {
                slippage,
                long_only,
                depth,
                cutoff,
            },
            market_drawdowns,
        ),
        Command::Portfolio {
            data,
            strategy,
            weights,
            vote,
            slippage,
            start,
            end,
        } => run_portfolio(&data, &strategy, weights.as_deref(), vote, slippage, start, end),
        Command::Info { data } => run_info(&data),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = StancetraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Command-line overrides applied on top of the config file.
struct BacktestOverrides {
    slippage: Option<f64>,
    long_only: bool,
    depth: Option<usize>,
    cutoff: Option<f64>,
}

fn run_backtest(
    data_path: &PathBuf,
    config_path: Option<&PathBuf>,
    spec_override: Option<&str>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    overrides: BacktestOverrides,
    market_drawdowns: bool,
) -> ExitCode {
    // Stage 1: Load config (defaults when no file given)
    let adapter = match config_path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            match load_config(path) {
                Ok(a) => Some(a),
                Err(code) => return code,
            }
        }
        None => None,
    };

    let mut bt_config = match &adapter {
        Some(a) => match build_backtest_config(a) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        },
        None => BacktestConfig::default(),
    };
    if let Some(slippage) = overrides.slippage {
        bt_config.slippage = slippage;
    }
    if overrides.long_only {
        bt_config.long_only = true;
    }
    if let Some(depth) = overrides.depth {
        bt_config.dd_depth = depth;
    }
    if let Some(cutoff) = overrides.cutoff {
        bt_config.dd_cutoff_pct = cutoff;
    }

    // Stage 2: Resolve and parse the strategy spec
    let spec = match spec_override
        .map(str::to_string)
        .or_else(|| adapter.as_ref().and_then(|a| configured_spec(a)))
    {
        Some(s) => s,
        None => {
            eprintln!("error: no strategy given (use --strategy or [strategy] spec in config)");
            return ExitCode::from(2);
        }
    };
    let provider = match parse_spec(&spec) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Loading strategy: {}", provider.name());

    // Stage 3: Load price data
    eprintln!("Loading prices from {}", data_path.display());
    let prices = match CsvAdapter::new(data_path.clone()).fetch_prices(start, end) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!(
        "  {} bars, {} to {}",
        prices.len(),
        prices.first_date(),
        prices.last_date()
    );

    // Stage 4: Run the engine
    let mut backtest = Backtest::new(prices, provider, bt_config);

    let summary = match backtest.summary() {
        Ok(s) => s.clone(),
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    println!("=== Summary ===");
    print!("{summary}");

    let trades = match backtest.trades() {
        Ok(t) => t.to_vec(),
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    println!("\n=== Trades ===");
    print_trades(&trades);

    let dds = match backtest.drawdowns(Target::Strategy) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    println!("\n=== Strategy drawdowns ===");
    print_drawdowns(&dds);

    if market_drawdowns {
        let dds = match backtest.drawdowns(Target::Market) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        println!("\n=== Market drawdowns ===");
        print_drawdowns(&dds);
    }

    ExitCode::SUCCESS
}

fn run_portfolio(
    data_path: &PathBuf,
    specs: &[String],
    weights_arg: Option<&str>,
    vote: bool,
    slippage: Option<f64>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> ExitCode {
    let weights = match weights_arg.map(parse_weights).transpose() {
        Ok(w) => w,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("Loading prices from {}", data_path.display());
    let prices = match CsvAdapter::new(data_path.clone()).fetch_prices(start, end) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Run every component strategy over the same data.
    let slippage = slippage.unwrap_or(0.0);
    let mut components = Vec::with_capacity(specs.len());
    for spec in specs {
        let provider = match parse_spec(spec) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        eprintln!("Running component: {}", provider.name());
        let stance = provider.stances(&prices);
        match crate::domain::returns::run(&prices, &stance, slippage) {
            Ok(series) => components.push(series),
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        }
    }

    let policy = if vote {
        AggregationPolicy::MajorityVote
    } else {
        AggregationPolicy::WeightedBlend
    };
    let aggregated = match portfolio::aggregate(&components, weights.as_deref(), policy) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let summary = match summary::summarize(&aggregated) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    println!("=== Portfolio summary ({} components) ===", components.len());
    print!("{summary}");

    ExitCode::SUCCESS
}

fn run_info(data_path: &PathBuf) -> ExitCode {
    match CsvAdapter::new(data_path.clone()).data_range() {
        Ok((first, last, count)) => {
            println!("{}: {} bars, {} to {}", data_path.display(), count, first, last);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn parse_weights(arg: &str) -> Result<Vec<f64>, StancetraderError> {
    arg.split(',')
        .map(|s| {
            s.trim()
                .parse::<f64>()
                .map_err(|_| StancetraderError::InvalidWeights)
        })
        .collect()
}

fn print_trades(trades: &[TradeRecord]) {
    if trades.is_empty() {
        println!("(no trades)");
        return;
    }
    println!(
        "{:<12} {:<6} {:>10} {:<12} {:>10} {:>6} {:>9}",
        "Entry", "Side", "In", "Exit", "Out", "Days", "Return%"
    );
    for t in trades {
        let marker = if t.open { " (open)" } else { "" };
        println!(
            "{:<12} {:<6} {:>10.2} {:<12} {:>10.2} {:>6} {:>8.2}%{}",
            t.entry_date.to_string(),
            t.side.to_string(),
            t.entry_price,
            t.exit_date.to_string(),
            t.exit_price,
            t.holding_days,
            t.return_pct,
            marker,
        );
    }
}

fn print_drawdowns(dds: &[crate::domain::drawdown::DrawdownRecord]) {
    if dds.is_empty() {
        println!("(no drawdowns)");
        return;
    }
    println!(
        "{:<8} {:<12} {:<12} {:>6} {:<12} {:>6}",
        "Depth%", "Peak", "Trough", "Days", "Recovery", "Days"
    );
    for dd in dds {
        let recovery = if dd.recovered {
            dd.recovery_date.to_string()
        } else {
            "(open)".to_string()
        };
        println!(
            "{:<8.2} {:<12} {:<12} {:>6} {:<12} {:>6}",
            dd.depth_pct,
            dd.peak_date.to_string(),
            dd.trough_date.to_string(),
            dd.drawdown_days,
            recovery,
            dd.recovery_days,
        );
    }
}
