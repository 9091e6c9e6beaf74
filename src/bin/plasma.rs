//! Command-line access to the fused plasma computations.
//!
//! Reads a JSON ledger snapshot (see [`LedgerSnapshot`]) and reports the
//! plasma accounts can currently spend, confines plasma for new blocks, and
//! exposes the recharge multiplier and rate schedule helpers.

use fused_plasma::{
    fusion_recharge_rate_target, next_fusion_recharge_rate, recharge_rate_multiplier, Address,
    AvailabilityCalculator, ConfigError, LedgerError, LedgerSnapshot, PlasmaConfig, PlasmaReport,
};
use std::env;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "plasma_config.json";

fn fatal(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn print_help() {
    println!("Usage: plasma <available|batch|confine|multiplier|next-rate> ...");
    println!("  available <ledger.json> <address> [--config <file>] [--json]");
    println!("  batch <ledger.json> [--config <file>]");
    println!("  confine <ledger.json> <address> <plasma> [--config <file>]");
    println!("  multiplier <fused_plasma>");
    println!("  next-rate <base_plasma> <current_rate>");
}

/// Positional arguments plus the recognised flags.
struct Args {
    positional: Vec<String>,
    config: Option<String>,
    json: bool,
}

fn parse_args(raw: Vec<String>) -> Args {
    let mut positional = Vec::new();
    let mut config = None;
    let mut json = false;
    let mut iter = raw.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                config = Some(
                    iter.next()
                        .unwrap_or_else(|| fatal("--config requires a path")),
                );
            }
            "--json" => json = true,
            other if other.starts_with("--") => fatal(&format!("unknown flag {other}")),
            _ => positional.push(arg),
        }
    }
    Args {
        positional,
        config,
        json,
    }
}

fn parse_u64(value: &str, what: &str) -> u64 {
    value
        .parse::<u64>()
        .unwrap_or_else(|err| fatal(&format!("invalid {what} {value}: {err}")))
}

/// Configuration in effect plus whether it came from a file on disk.
struct LoadedConfig {
    config: PlasmaConfig,
    from_file: bool,
}

fn read_config(path: &Path) -> Result<LoadedConfig, ConfigError> {
    Ok(LoadedConfig {
        config: PlasmaConfig::load(path)?,
        from_file: path.exists(),
    })
}

fn load_config(args: &Args) -> LoadedConfig {
    let path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG);
    read_config(Path::new(path)).unwrap_or_else(|err| fatal(&err.to_string()))
}

/// Loads the ledger; a config file that was actually read, explicit or the
/// default, overrides the stored fusion ratio.
fn read_ledger(path: &Path, loaded: &LoadedConfig) -> Result<LedgerSnapshot, LedgerError> {
    let mut ledger = LedgerSnapshot::load(path)?;
    if loaded.from_file {
        ledger.set_ratio(loaded.config.fusion_ratio());
    }
    Ok(ledger)
}

fn load_ledger(path: &str, loaded: &LoadedConfig) -> LedgerSnapshot {
    read_ledger(Path::new(path), loaded).unwrap_or_else(|err| fatal(&err.to_string()))
}

fn init_logging(config: &PlasmaConfig) {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_report(report: &PlasmaReport) {
    println!("address:      {}", report.address);
    println!("frontier:     {}", report.frontier_height);
    println!("fused:        {}", report.fused);
    println!(
        "recharge:     {} confirmations x {} x {}",
        report.confirmations, report.base_recharge_rate, report.multiplier
    );
    println!("recharged:    {}", report.recharged);
    println!("confined:     {}", report.confined);
    println!("available:    {}", report.available);
}

fn cmd_available(args: Args) {
    let [ledger_path, address] = args.positional.as_slice() else {
        fatal("Usage: plasma available <ledger.json> <address> [--config <file>] [--json]");
    };
    let loaded = load_config(&args);
    init_logging(&loaded.config);
    let ledger = load_ledger(ledger_path, &loaded);
    let calc = AvailabilityCalculator::new(&ledger);
    let report = calc
        .report(&Address::new(address.as_str()))
        .unwrap_or_else(|err| fatal(&err.to_string()));
    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => fatal(&format!("failed to encode report: {err}")),
        }
    } else {
        print_report(&report);
    }
}

fn cmd_batch(args: Args) {
    let [ledger_path] = args.positional.as_slice() else {
        fatal("Usage: plasma batch <ledger.json> [--config <file>]");
    };
    let loaded = load_config(&args);
    init_logging(&loaded.config);
    let ledger = load_ledger(ledger_path, &loaded);
    let addresses = ledger.addresses();
    let calc = AvailabilityCalculator::new(&ledger);

    #[cfg(not(target_arch = "wasm32"))]
    let results = {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = loaded.config.batch_threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .unwrap_or_else(|err| fatal(&format!("failed to start worker pool: {err}")));
        pool.install(|| calc.report_batch(&addresses))
    };
    #[cfg(target_arch = "wasm32")]
    let results = calc.report_batch(&addresses);

    info!(accounts = addresses.len(), "evaluated ledger");
    for (address, result) in addresses.iter().zip(results) {
        match result {
            Ok(report) => println!("{address} available={} fused={}", report.available, report.fused),
            Err(err) => println!("{address} error={err}"),
        }
    }
}

fn cmd_confine(args: Args) {
    let [ledger_path, address, plasma] = args.positional.as_slice() else {
        fatal("Usage: plasma confine <ledger.json> <address> <plasma> [--config <file>]");
    };
    let loaded = load_config(&args);
    init_logging(&loaded.config);
    let plasma = parse_u64(plasma, "plasma");
    let mut ledger = load_ledger(ledger_path, &loaded);
    let stored = ledger
        .confine_block(&Address::new(address.as_str()), plasma)
        .unwrap_or_else(|err| fatal(&err.to_string()));
    ledger
        .save(Path::new(ledger_path))
        .unwrap_or_else(|err| fatal(&err.to_string()));
    println!("confined plasma for {address}: {stored}");
}

fn cmd_multiplier(args: Args) {
    let [fused] = args.positional.as_slice() else {
        fatal("Usage: plasma multiplier <fused_plasma>");
    };
    let multiplier = recharge_rate_multiplier(parse_u64(fused, "fused plasma"));
    println!(
        "multiplier {multiplier} ({}/{})",
        multiplier.numerator(),
        multiplier.denominator()
    );
}

fn cmd_next_rate(args: Args) {
    let [base_plasma, current] = args.positional.as_slice() else {
        fatal("Usage: plasma next-rate <base_plasma> <current_rate>");
    };
    let target = fusion_recharge_rate_target(parse_u64(base_plasma, "base plasma"));
    let next = next_fusion_recharge_rate(parse_u64(current, "recharge rate"), target);
    println!("target {target}");
    println!("next   {next}");
}

fn main() {
    let mut raw = env::args().skip(1);
    let command = raw.next();
    let args = parse_args(raw.collect());
    match command.as_deref() {
        Some("available") => cmd_available(args),
        Some("batch") => cmd_batch(args),
        Some("confine") => cmd_confine(args),
        Some("multiplier") => cmd_multiplier(args),
        Some("next-rate") => cmd_next_rate(args),
        Some("help") | Some("--help") | None => print_help(),
        Some(other) => {
            print_help();
            fatal(&format!("unknown command {other}"));
        }
    }
}
