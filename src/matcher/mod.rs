//! Address rendering and pattern matching.

mod pattern;

pub use pattern::{Address, AddressError, MatchResult, Pattern};
