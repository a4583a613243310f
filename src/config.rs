//! Runtime configuration for the proxy vanity address search.

use std::path::PathBuf;

use clap::Parser;

use crate::crypto::{encode_constructor_args, CtorLayout};
use crate::matcher::{Address, AddressError, Pattern};

/// Per-worker progress interval when running several workers.
pub const DEFAULT_PROGRESS_EVERY: u64 = 5_000_000;
/// Per-worker progress interval for a single worker.
pub const SINGLE_THREAD_PROGRESS_EVERY: u64 = 500_000;

/// zkBob proxy vanity address generator
///
/// Searches CREATE2 salts until the address of the proxy deployed through the
/// factory matches the given regular expression.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Proxy admin passed as the first constructor argument
    #[arg(long, default_value = "0x39F0bD56c1439a22Ee90b4972c16b7868D161981")]
    pub deployer: String,

    /// Placeholder implementation passed as the second constructor argument
    #[arg(long = "mock-impl", default_value = "0xdead")]
    pub mock_impl: String,

    /// CREATE2 factory address
    #[arg(long, default_value = "0xce0042B868300000d44A59004Da54A005ffdcf9f")]
    pub factory: String,

    /// Regular expression tested against the 0x-prefixed checksummed address
    #[arg(short, long, default_value = "^0xB0B.*B0B$")]
    pub pattern: String,

    /// Number of worker threads
    #[arg(short = 't', long, default_value = "10")]
    pub threads: usize,

    /// Compiled proxy artifact containing `bytecode.object`
    #[arg(short, long, default_value = "./contracts/EIP1967Proxy.json")]
    pub artifact: PathBuf,

    /// Proxy constructor layout: admin-impl or admin-impl-data
    #[arg(long, default_value = "admin-impl-data")]
    pub ctor_layout: CtorLayout,

    /// Raw ABI-encoded constructor arguments (hex), overrides --ctor-layout
    #[arg(long)]
    pub ctor_args: Option<String>,

    /// Match the EIP-55 casing exactly
    #[arg(short = 'c', long, default_value = "false")]
    pub case_sensitive: bool,

    /// Only try nonces below this bound
    #[arg(long)]
    pub max_nonce: Option<u64>,

    /// Per-worker progress log interval in iterations
    #[arg(long)]
    pub progress_every: Option<u64>,

    /// Aggregate progress report interval in seconds
    #[arg(short = 'r', long, default_value = "5")]
    pub report_interval: u64,

    /// Print the match as a JSON object on stdout
    #[arg(long, default_value = "false")]
    pub json: bool,
}

/// Immutable search configuration shared by every worker.
#[derive(Debug, Clone)]
pub struct SearchParameters {
    pub deployer: [u8; 20],
    pub implementation: [u8; 20],
    pub factory: [u8; 20],
    pub pattern: Pattern,
    pub workers: usize,
    /// Exclusive upper bound on the nonce; `None` searches the whole u64 space.
    pub max_nonce: Option<u64>,
    pub progress_every: u64,
}

impl SearchParameters {
    pub fn new(
        deployer: [u8; 20],
        implementation: [u8; 20],
        factory: [u8; 20],
        pattern: Pattern,
        workers: usize,
    ) -> Self {
        Self {
            deployer,
            implementation,
            factory,
            pattern,
            workers,
            max_nonce: None,
            progress_every: default_progress_every(workers),
        }
    }

    pub fn with_max_nonce(mut self, max_nonce: Option<u64>) -> Self {
        self.max_nonce = max_nonce;
        self
    }

    pub fn with_progress_every(mut self, progress_every: u64) -> Self {
        self.progress_every = progress_every;
        self
    }
}

pub fn default_progress_every(workers: usize) -> u64 {
    if workers == 1 {
        SINGLE_THREAD_PROGRESS_EVERY
    } else {
        DEFAULT_PROGRESS_EVERY
    }
}

impl Config {
    /// Validates everything that does not need the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.search_parameters().map(drop)
    }

    pub fn compile_pattern(&self) -> Result<Pattern, ConfigError> {
        Pattern::new(self.pattern.as_str(), self.case_sensitive)
            .map_err(|e| ConfigError::InvalidPattern(e.to_string()))
    }

    /// Builds the immutable parameters handed to the worker pool.
    pub fn search_parameters(&self) -> Result<SearchParameters, ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::InvalidConfig(
                "threads must be at least 1".into(),
            ));
        }
        if self.progress_every == Some(0) {
            return Err(ConfigError::InvalidConfig(
                "progress-every must be at least 1".into(),
            ));
        }
        if self.report_interval == 0 {
            return Err(ConfigError::InvalidConfig(
                "report-interval must be at least 1 second".into(),
            ));
        }
        self.custom_ctor_args()?;

        let params = SearchParameters::new(
            parse_address("deployer", &self.deployer)?,
            parse_address("mock-impl", &self.mock_impl)?,
            parse_address("factory", &self.factory)?,
            self.compile_pattern()?,
            self.threads,
        )
        .with_max_nonce(self.max_nonce);
        Ok(match self.progress_every {
            Some(n) => params.with_progress_every(n),
            None => params,
        })
    }

    /// Encoded constructor arguments appended to the proxy bytecode.
    pub fn constructor_args(&self, params: &SearchParameters) -> Result<Vec<u8>, ConfigError> {
        Ok(match self.custom_ctor_args()? {
            Some(raw) => raw,
            None => {
                encode_constructor_args(self.ctor_layout, &params.deployer, &params.implementation)
            }
        })
    }

    fn custom_ctor_args(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        let Some(ref raw) = self.ctor_args else {
            return Ok(None);
        };
        let h = raw.strip_prefix("0x").unwrap_or(raw);
        hex::decode(h)
            .map(Some)
            .map_err(|e| ConfigError::InvalidConfig(format!("ctor-args: {}", e)))
    }
}

fn parse_address(name: &'static str, value: &str) -> Result<[u8; 20], ConfigError> {
    Address::parse(value)
        .map(|a| a.0)
        .map_err(|source| ConfigError::InvalidAddress { name, source })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Invalid {name} address: {source}")]
    InvalidAddress {
        name: &'static str,
        source: AddressError,
    },
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
