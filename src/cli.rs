//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::{CsvReportAdapter, format_timestamp};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::aggregate::AggregateRow;
use crate::domain::config_validation::build_engine_config;
use crate::domain::digest::{Digest, SignalSnapshot};
use crate::domain::error::SignaldeskError;
use crate::domain::pipeline::{
    AnalysisMap, EngineConfig, aggregate_results, analyze_store, load_store,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "signaldesk",
    about = "Technical indicators, crossover signals and threshold backtests"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyse instruments and print per-instrument and aggregate results
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Analyse only this symbol
        #[arg(long)]
        symbol: Option<String>,
        /// Write CSV reports here (overrides [report] output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file without reading any data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List instruments available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the latest signal and recent events per instrument
    Digest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub dir: PathBuf,
    /// Empty means every CSV file in `dir`.
    pub symbols: Vec<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    pub output_dir: Option<PathBuf>,
    pub recent: usize,
    pub print_trades: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub engine: EngineConfig,
    pub data: DataSettings,
    pub report: ReportSettings,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Run {
            config,
            symbol,
            output,
        } => run_analysis(&config, symbol.as_deref(), output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Digest { config, symbol } => run_digest(&config, symbol.as_deref()),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Load and validate every section. Relative paths resolve against the
/// directory holding the config file.
pub fn load_settings(path: &Path) -> Result<Settings, SignaldeskError> {
    info!(path = %path.display(), "loading config");
    let adapter = FileConfigAdapter::from_file(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    Ok(Settings {
        engine: build_engine_config(&adapter)?,
        data: build_data_settings(&adapter, base)?,
        report: build_report_settings(&adapter, base)?,
    })
}

fn parse_date(adapter: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, SignaldeskError> {
    match adapter.get_string("data", key) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                SignaldeskError::invalid("data", key, "invalid date format (expected YYYY-MM-DD)")
            }),
    }
}

pub fn parse_symbols(raw: &str) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for s in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !symbols.iter().any(|existing| existing == s) {
            symbols.push(s.to_string());
        }
    }
    symbols
}

fn resolve_path(base: &Path, raw: &str) -> PathBuf {
    let path = PathBuf::from(raw.trim());
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

pub fn build_data_settings(
    adapter: &dyn ConfigPort,
    base: &Path,
) -> Result<DataSettings, SignaldeskError> {
    let dir = adapter
        .get_string("data", "dir")
        .ok_or_else(|| SignaldeskError::ConfigMissing {
            section: "data".into(),
            key: "dir".into(),
        })?;

    let start = parse_date(adapter, "start")?;
    let end = parse_date(adapter, "end")?;
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(SignaldeskError::invalid(
                "data",
                "start",
                "start must not be after end",
            ));
        }
    }

    Ok(DataSettings {
        dir: resolve_path(base, &dir),
        symbols: adapter
            .get_string("data", "symbols")
            .map(|s| parse_symbols(&s))
            .unwrap_or_default(),
        start,
        end,
    })
}

pub fn build_report_settings(
    adapter: &dyn ConfigPort,
    base: &Path,
) -> Result<ReportSettings, SignaldeskError> {
    let recent = match adapter.get_string("report", "recent") {
        None => 5,
        Some(raw) => raw.parse::<usize>().map_err(|_| {
            SignaldeskError::invalid("report", "recent", "must be a non-negative integer")
        })?,
    };
    Ok(ReportSettings {
        output_dir: adapter
            .get_string("report", "output_dir")
            .map(|d| resolve_path(base, &d)),
        recent,
        print_trades: adapter.get_bool("report", "print_trades", false),
    })
}

/// `--symbol` wins, then `[data] symbols`, then whatever the data source has.
pub fn resolve_symbols(
    symbol_override: Option<&str>,
    settings: &DataSettings,
    data: &dyn DataPort,
) -> Result<Vec<String>, SignaldeskError> {
    if let Some(symbol) = symbol_override {
        return Ok(parse_symbols(symbol));
    }
    if !settings.symbols.is_empty() {
        return Ok(settings.symbols.clone());
    }
    data.list_symbols()
}

/// Load, ingest and analyse. Fails only when nothing could be loaded or
/// every instrument failed; otherwise failures stay in their own slot.
pub fn analyze(
    data: &dyn DataPort,
    symbols: &[String],
    settings: &Settings,
) -> Result<AnalysisMap, SignaldeskError> {
    if symbols.is_empty() {
        return Err(SignaldeskError::NoData {
            symbol: settings.data.dir.display().to_string(),
        });
    }

    let (store, load) = load_store(data, symbols, settings.data.start, settings.data.end);
    info!(
        loaded = load.loaded.len(),
        skipped = load.skipped.len(),
        dropped_bars = load.dropped_bars,
        "instruments loaded"
    );
    if store.is_empty() {
        return Err(load
            .skipped
            .into_iter()
            .next()
            .map(|(_, e)| e)
            .unwrap_or_else(|| SignaldeskError::NoData {
                symbol: symbols.join(","),
            }));
    }

    let mut results = analyze_store(&store, &settings.engine)?;
    if results.values().all(|r| r.is_err()) {
        if let Some((_, Err(e))) = results.pop_first() {
            return Err(e);
        }
    }
    Ok(results)
}

pub fn write_reports(
    reports: &dyn ReportPort,
    results: &AnalysisMap,
    aggregate: &[AggregateRow],
) -> Result<(), SignaldeskError> {
    for (symbol, result) in results {
        let Ok(analysis) = result else { continue };
        reports.write_indicators(symbol, &analysis.enriched.rows, &analysis.signals)?;
        reports.write_trades(symbol, &analysis.backtest.trades)?;
    }
    reports.write_aggregate(aggregate)
}

fn pct(v: f64) -> String {
    format!("{:+.2}%", v * 100.0)
}

fn opt(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

pub fn format_summaries(results: &AnalysisMap) -> String {
    results
        .iter()
        .map(|(symbol, result)| match result {
            Ok(a) => {
                let s = &a.backtest.summary;
                format!(
                    "{:<8} bars={:<5} trades={:<4} total_return={:<9} win_rate={:.1}% buy_hold={} strategy={}\n",
                    symbol,
                    a.enriched.len(),
                    s.trade_count,
                    pct(s.total_return),
                    s.win_rate * 100.0,
                    pct(a.backtest.final_buy_and_hold()),
                    pct(a.backtest.final_strategy_return()),
                )
            }
            Err(e) => format!("{:<8} failed: {}\n", symbol, e),
        })
        .collect()
}

pub fn format_aggregate(rows: &[AggregateRow]) -> String {
    let header = format!(
        "{:<8} {:>6} {:>9} {:>9} {:>6} {:>6} {:>5} {:>5} {:>6} {:>6}\n",
        "symbol", "bars", "mean_atr", "mean_rsi", "golden", "death", "ob", "os", "lower", "upper"
    );
    let body = rows.iter().map(|r| {
        format!(
            "{:<8} {:>6} {:>9} {:>9} {:>6} {:>6} {:>5} {:>5} {:>6} {:>6}\n",
            r.symbol,
            r.bars,
            opt(r.mean_atr),
            opt(r.mean_rsi),
            r.golden_crosses,
            r.death_crosses,
            r.overbought_days,
            r.oversold_days,
            r.lower_band_touches,
            r.upper_band_breaks,
        )
    });
    std::iter::once(header).chain(body).collect()
}

fn describe(snapshot: &SignalSnapshot) -> String {
    let notes: Vec<String> = snapshot
        .cross
        .iter()
        .map(ToString::to_string)
        .chain(snapshot.tags.iter().map(ToString::to_string))
        .collect();
    let notes = if notes.is_empty() {
        String::new()
    } else {
        format!(" [{}]", notes.join("; "))
    };
    format!(
        "{} close={:.2} rsi={} signal={}{}",
        format_timestamp(&snapshot.timestamp),
        snapshot.close,
        opt(snapshot.rsi),
        snapshot.signal,
        notes
    )
}

pub fn format_digest(digest: &Digest) -> String {
    let mut out = String::new();
    for (symbol, d) in &digest.instruments {
        out.push_str(&format!("== {} ==\n", symbol));
        if let Some(latest) = &d.latest {
            out.push_str(&format!("latest: {}\n", describe(latest)));
        }
        out.push_str(&format!(
            "trades={} total_return={} win_rate={:.1}%\n",
            d.summary.trade_count,
            pct(d.summary.total_return),
            d.summary.win_rate * 100.0
        ));
        if !d.recent.is_empty() {
            out.push_str("recent:\n");
            for event in &d.recent {
                out.push_str(&format!("  {}\n", describe(event)));
            }
        }
    }
    out
}

fn format_trades(results: &AnalysisMap) -> String {
    results
        .iter()
        .filter_map(|(symbol, result)| Some((symbol, result.as_ref().ok()?)))
        .flat_map(|(symbol, a)| {
            a.backtest.trades.iter().map(move |t| {
                format!(
                    "{:<8} {:<5} {} @ {:.4} -> {} @ {:.4} {} ({})\n",
                    symbol,
                    t.side,
                    format_timestamp(&t.entry_ts),
                    t.entry_price,
                    format_timestamp(&t.exit_ts),
                    t.exit_price,
                    pct(t.return_pct),
                    t.exit_reason,
                )
            })
        })
        .collect()
}

fn run_analysis(
    config_path: &Path,
    symbol: Option<&str>,
    output: Option<&Path>,
) -> Result<(), SignaldeskError> {
    let settings = load_settings(config_path)?;
    let data = CsvAdapter::new(settings.data.dir.clone());
    let symbols = resolve_symbols(symbol, &settings.data, &data)?;
    info!(instruments = symbols.len(), "running analysis");

    let results = analyze(&data, &symbols, &settings)?;
    let aggregate = aggregate_results(&results);

    print!("{}", format_summaries(&results));
    println!();
    print!("{}", format_aggregate(&aggregate));
    if settings.report.print_trades {
        println!();
        print!("{}", format_trades(&results));
    }

    let output_dir = output
        .map(Path::to_path_buf)
        .or_else(|| settings.report.output_dir.clone());
    match output_dir {
        Some(dir) => write_reports(&CsvReportAdapter::new(dir), &results, &aggregate),
        None => Ok(()),
    }
}

fn run_validate(config_path: &Path) -> Result<(), SignaldeskError> {
    let settings = load_settings(config_path)?;
    print!("{}", format_settings(&settings));
    println!("configuration is valid");
    Ok(())
}

pub fn format_settings(settings: &Settings) -> String {
    let e = &settings.engine;
    let indicators: Vec<String> = e
        .indicators
        .indicator_types()
        .iter()
        .map(ToString::to_string)
        .collect();
    format!(
        "indicators: {}\nsignals: {} crossover, rsi overbought {} oversold {}\nbacktest: take_profit {} stop_loss {}\ndata: {}\n",
        indicators.join(", "),
        e.signals.ma_kind,
        e.signals.rsi_overbought,
        e.signals.rsi_oversold,
        e.backtest.take_profit,
        e.backtest.stop_loss,
        settings.data.dir.display()
    )
}

fn run_list_symbols(config_path: &Path) -> Result<(), SignaldeskError> {
    let settings = load_settings(config_path)?;
    let symbols = CsvAdapter::new(settings.data.dir.clone()).list_symbols()?;
    if symbols.is_empty() {
        warn!(dir = %settings.data.dir.display(), "no symbols found");
    }
    for symbol in &symbols {
        println!("{}", symbol);
    }
    Ok(())
}

fn run_digest(config_path: &Path, symbol: Option<&str>) -> Result<(), SignaldeskError> {
    let settings = load_settings(config_path)?;
    let data = CsvAdapter::new(settings.data.dir.clone());
    let symbols = resolve_symbols(symbol, &settings.data, &data)?;
    let results = analyze(&data, &symbols, &settings)?;
    let digest = Digest::build(&results, settings.report.recent);
    print!("{}", format_digest(&digest));
    Ok(())
}
