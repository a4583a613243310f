//! Hashing and CREATE2 address derivation.
//!
//! - salt(i) = 24 zero bytes || i (u64, big-endian)
//! - init_code_hash = keccak256(bytecode || constructor args)
//! - address = keccak256(0xff || factory || salt || init_code_hash)[12..32]

pub mod artifact;
pub mod create2;
pub mod initcode;

pub use artifact::{load_bytecode, ArtifactError};
pub use create2::{create2_address, salt_from_nonce};
pub use initcode::{encode_constructor_args, init_code_hash, CtorLayout};

use tiny_keccak::{Hasher, Keccak};

/// Keccak-256 of arbitrary bytes (output 32 bytes).
pub fn keccak256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(input);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}
