//! zkBob proxy vanity address CLI
//!
//! Mines CREATE2 salts until the proxy address deployed through the factory
//! matches the pattern, e.g. `bob_vanity --pattern '^0xB0B.*B0B$' --threads 16`.

use std::error::Error;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{error, info, warn};

use bob_vanity::crypto::{init_code_hash, load_bytecode};
use bob_vanity::{Address, Config, PoolEvent, SearchResult, WorkerPool};

/// How a search that got past startup ended.
#[derive(Debug)]
enum Outcome {
    Found(SearchResult),
    Exhausted,
    Interrupted,
}

impl Outcome {
    fn exit_code(&self) -> i32 {
        match self {
            Outcome::Found(_) => 0,
            Outcome::Exhausted | Outcome::Interrupted => 2,
        }
    }
}

/// Startup errors exit with 1.
const EXIT_STARTUP_ERROR: i32 = 1;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();

    let interrupt = Arc::new(AtomicBool::new(false));
    let handler_flag = interrupt.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_flag.store(true, Ordering::Relaxed)) {
        error!("can't set Ctrl-C handler: {}", e);
        process::exit(EXIT_STARTUP_ERROR);
    }

    match run(&config, interrupt) {
        Ok(outcome) => process::exit(outcome.exit_code()),
        Err(e) => {
            error!("{}", e);
            process::exit(EXIT_STARTUP_ERROR);
        }
    }
}

/// Runs one search. `interrupt` doubles as the pool's stop flag, so raising
/// it ends the search with [`Outcome::Interrupted`].
fn run(config: &Config, interrupt: Arc<AtomicBool>) -> Result<Outcome, Box<dyn Error>> {
    let params = config.search_parameters()?;

    let contract = config
        .artifact
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    info!("Factory address: {}", Address::from_bytes(params.factory));
    info!("Contract: {}", contract);
    info!("Deployer: {}", Address::from_bytes(params.deployer));
    info!("Implementation: {}", Address::from_bytes(params.implementation));
    info!("Constructor layout: {}", config.ctor_layout);
    info!("Threads: {}", params.workers);
    info!("Generating vanity addr: {}", params.pattern.pattern());
    if let Some(max) = params.max_nonce {
        info!("Nonce limit: {}", max);
    }
    if params.workers > num_cpus::get() {
        warn!(
            "{} threads requested but only {} CPUs available",
            params.workers,
            num_cpus::get()
        );
    }

    let bytecode = load_bytecode(&config.artifact)?;
    let args = config.constructor_args(&params)?;
    let code_hash = init_code_hash(&bytecode, &args);
    info!("Code hash: 0x{}", hex::encode(code_hash));

    let pool = WorkerPool::with_stop_flag(params, code_hash, interrupt)?;

    let report_interval = Duration::from_secs(config.report_interval);
    let found = loop {
        match pool.wait_for_result(report_interval) {
            PoolEvent::Found(result) => break Some(result),
            PoolEvent::Pending => print_progress(&pool),
            PoolEvent::Finished => break None,
        }
    };

    let outcome = match found {
        Some(result) => {
            info!(
                "Found, nonce: {}, salt: {}, address: {}",
                result.nonce,
                result.salt_hex(),
                result.address_checksum()
            );
            if config.json {
                println!("{}", serde_json::to_string(&result.report())?);
            } else {
                print_result(&result);
            }
            Outcome::Found(result)
        }
        // Only a match or an interrupt raises the stop flag.
        None if pool.is_stopped() => {
            warn!("Stopped by user.");
            Outcome::Interrupted
        }
        None => {
            warn!("Nonce space exhausted without a match.");
            Outcome::Exhausted
        }
    };

    info!(
        "Tried {} nonces in {:.2}s ({}/s)",
        format_number(pool.total_nonces()),
        pool.elapsed().as_secs_f64(),
        format_number(pool.nonces_per_second() as u64)
    );

    pool.join();
    Ok(outcome)
}

fn print_result(result: &SearchResult) {
    println!("=== Match ===");
    println!("Address:  {}", result.address_checksum());
    println!("Salt:     {}", result.salt_hex());
    println!("Nonce:    {}", result.nonce);
    println!("Worker:   {}", result.worker_id);
}

fn print_progress(pool: &WorkerPool) {
    info!(
        "[{:>4}s] Tried {} nonces ({}/s)",
        pool.elapsed().as_secs(),
        format_number(pool.total_nonces()),
        format_number(pool.nonces_per_second() as u64)
    );
}

fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1e9)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1e6)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1e3)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use tempfile::NamedTempFile;

    fn artifact() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"bytecode": {{"object": "0x6080604052600080fdfe"}}}}"#).unwrap();
        file
    }

    fn config(args: &[&str]) -> Config {
        let mut argv = vec!["bob_vanity", "--threads", "2", "--report-interval", "1"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    fn not_interrupted() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[test]
    fn test_exhausted_search_exits_2() {
        let file = artifact();
        let path = file.path().to_str().unwrap();
        // `z` never appears in a hex address.
        let cfg = config(&["--artifact", path, "--pattern", "^0xz", "--max-nonce", "200"]);
        let outcome = run(&cfg, not_interrupted()).unwrap();
        assert!(matches!(outcome, Outcome::Exhausted));
        assert_eq!(outcome.exit_code(), 2);
    }

    #[test]
    fn test_match_exits_0() {
        let file = artifact();
        let path = file.path().to_str().unwrap();
        let cfg = config(&["--artifact", path, "--pattern", "^0x", "--max-nonce", "10"]);
        match run(&cfg, not_interrupted()).unwrap() {
            Outcome::Found(result) => {
                assert!(result.nonce < 2);
                assert_eq!(Outcome::Found(result).exit_code(), 0);
            }
            other => panic!("expected a match, got {:?}", other),
        }
    }

    #[test]
    fn test_interrupt_exits_2() {
        let file = artifact();
        let path = file.path().to_str().unwrap();
        let cfg = config(&["--artifact", path, "--pattern", "^0xz"]);
        let outcome = run(&cfg, Arc::new(AtomicBool::new(true))).unwrap();
        assert!(matches!(outcome, Outcome::Interrupted));
        assert_eq!(outcome.exit_code(), 2);
    }

    #[test]
    fn test_missing_artifact_is_startup_error() {
        let cfg = config(&["--artifact", "/nonexistent/EIP1967Proxy.json"]);
        let err = run(&cfg, not_interrupted()).unwrap_err();
        assert!(err.to_string().contains("EIP1967Proxy.json"));
    }

    #[test]
    fn test_invalid_pattern_is_startup_error() {
        let file = artifact();
        let path = file.path().to_str().unwrap();
        let cfg = config(&["--artifact", path, "--pattern", "^0x(b0b"]);
        let err = run(&cfg, not_interrupted()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid pattern"));
    }
}
