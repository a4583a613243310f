//! Regular-expression matching against checksummed addresses.

use regex::{Regex, RegexBuilder};

use crate::crypto::keccak256;

/// A 20-byte address (e.g. a predicted proxy address).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 20]);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address must be at most 40 hex chars, got {0}")]
    TooLong(usize),
    #[error("address is empty")]
    Empty,
    #[error("address contains non-hex characters")]
    InvalidHex,
}

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    #[inline]
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parses hex with or without `0x`. Short input is left-padded with
    /// zeros, so `0xdead` is `0x000...dead`.
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let h = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        if h.is_empty() {
            return Err(AddressError::Empty);
        }
        if h.len() > 40 {
            return Err(AddressError::TooLong(h.len()));
        }
        if !h.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidHex);
        }
        let padded = format!("{:0>40}", h);
        let mut out = [0u8; 20];
        hex::decode_to_slice(padded, &mut out).map_err(|_| AddressError::InvalidHex)?;
        Ok(Self(out))
    }

    /// Lowercase hex (no 0x).
    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Renders the EIP-55 checksum (`0x` + 40 digits) into `out` without
    /// allocating.
    #[inline]
    pub fn write_checksum(&self, out: &mut [u8; 42]) {
        out[0] = b'0';
        out[1] = b'x';
        for (i, byte) in self.0.iter().enumerate() {
            out[2 + i * 2] = HEX_DIGITS[(byte >> 4) as usize];
            out[3 + i * 2] = HEX_DIGITS[(byte & 0x0f) as usize];
        }
        let hash = keccak256(&out[2..]);
        for i in 0..40 {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if nibble >= 8 {
                out[2 + i].make_ascii_uppercase();
            }
        }
    }

    /// EIP-55 checksum.
    pub fn to_checksum(&self) -> String {
        let mut buf = [0u8; 42];
        self.write_checksum(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_checksum())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    Match,
    NoMatch,
}

impl MatchResult {
    #[inline]
    pub fn is_match(self) -> bool {
        matches!(self, MatchResult::Match)
    }
}

/// A compiled address pattern. Addresses are tested in their `0x`-prefixed
/// EIP-55 form.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(pattern: impl Into<String>, case_sensitive: bool) -> Result<Self, regex::Error> {
        let source = pattern.into();
        let regex = RegexBuilder::new(&source)
            .case_insensitive(!case_sensitive)
            .build()?;
        Ok(Self { source, regex })
    }

    pub fn pattern(&self) -> &str {
        &self.source
    }

    /// Tests an already rendered address string.
    #[inline]
    pub fn matches_str(&self, checksummed: &str) -> MatchResult {
        if self.regex.is_match(checksummed) {
            MatchResult::Match
        } else {
            MatchResult::NoMatch
        }
    }

    /// Renders the checksum on the stack and tests it.
    #[inline]
    pub fn matches(&self, address: &Address) -> MatchResult {
        let mut buf = [0u8; 42];
        address.write_checksum(&mut buf);
        match std::str::from_utf8(&buf) {
            Ok(s) => self.matches_str(s),
            Err(_) => MatchResult::NoMatch,
        }
    }
}
