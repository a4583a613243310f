//! # bob_vanity
//!
//! CREATE2 vanity address search for zkBob proxy deployments. Tries salts
//! derived from sequential nonces until the address of the proxy deployed
//! through a CREATE2 factory matches a regular expression.
//!
//! address = keccak256(0xff || factory || salt || keccak256(bytecode || ctorArgs))[12..32]

pub mod config;
pub mod crypto;
pub mod matcher;
pub mod worker;

pub use config::{Config, ConfigError, SearchParameters};
pub use crypto::{create2_address, salt_from_nonce, CtorLayout};
pub use matcher::{Address, MatchResult, Pattern};
pub use worker::{PoolEvent, SearchResult, WorkerPool};
