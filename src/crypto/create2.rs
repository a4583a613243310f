//! CREATE2 address computation.
//!
//! address = keccak256(0xff || factory || salt || init_code_hash)[12..32]

use crate::crypto::keccak256;

/// Encodes a search nonce as a CREATE2 salt: 24 zero bytes followed by the
/// nonce as a big-endian u64.
#[inline]
pub fn salt_from_nonce(nonce: u64) -> [u8; 32] {
    let mut salt = [0u8; 32];
    salt[24..32].copy_from_slice(&nonce.to_be_bytes());
    salt
}

/// Computes the address a CREATE2 deployment from `factory` would land on.
/// Preimage: 0xff (1) || factory (20) || salt (32) || init_code_hash (32) = 85 bytes.
#[inline]
pub fn create2_address(
    factory: &[u8; 20],
    salt: &[u8; 32],
    init_code_hash: &[u8; 32],
) -> [u8; 20] {
    let mut preimage = [0u8; 85];
    preimage[0] = 0xff;
    preimage[1..21].copy_from_slice(factory);
    preimage[21..53].copy_from_slice(salt);
    preimage[53..85].copy_from_slice(init_code_hash);

    let hash = keccak256(&preimage);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..32]);
    addr
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr_hex(a: &[u8; 20]) -> String {
        hex::encode(a)
    }

    #[test]
    fn test_salt_layout() {
        let salt = salt_from_nonce(0x0102030405060708);
        assert_eq!(&salt[..24], &[0u8; 24]);
        assert_eq!(&salt[24..], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(salt_from_nonce(0), [0u8; 32]);
        assert_eq!(&salt_from_nonce(u64::MAX)[24..], &[0xff; 8]);
    }

    /// EIP-1014 example 0: zero factory, zero salt, init code 0x00.
    #[test]
    fn test_eip1014_vector() {
        let init_code_hash = keccak256(&[0x00]);
        let addr = create2_address(&[0u8; 20], &[0u8; 32], &init_code_hash);
        assert_eq!(addr_hex(&addr), "4d1a2e2bb4f88f0250f26ffff098b0b30b26bf38");
    }

    #[test]
    fn test_matches_manual_preimage() {
        let factory = [0x11u8; 20];
        let init_code_hash = [0x22u8; 32];
        for nonce in [0u64, 1, 42, u64::MAX] {
            let salt = salt_from_nonce(nonce);
            let mut msg = vec![0xffu8];
            msg.extend_from_slice(&factory);
            msg.extend_from_slice(&salt);
            msg.extend_from_slice(&init_code_hash);
            let expected = &keccak256(&msg)[12..];
            assert_eq!(&create2_address(&factory, &salt, &init_code_hash)[..], expected);
        }
    }
}
