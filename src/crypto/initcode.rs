//! Proxy init code assembly: deployment bytecode followed by ABI-encoded
//! constructor arguments.

use std::str::FromStr;

use crate::crypto::keccak256;

/// Constructor signature of the proxy being deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CtorLayout {
    /// `constructor(address admin, address implementation)`
    AdminImpl,
    /// `constructor(address admin, address implementation, bytes data)` with
    /// empty `data`.
    #[default]
    AdminImplData,
}

impl CtorLayout {
    /// Length of the encoded argument block in bytes.
    pub fn encoded_len(self) -> usize {
        match self {
            CtorLayout::AdminImpl => 64,
            CtorLayout::AdminImplData => 128,
        }
    }
}

impl FromStr for CtorLayout {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin-impl" => Ok(CtorLayout::AdminImpl),
            "admin-impl-data" => Ok(CtorLayout::AdminImplData),
            _ => Err(format!("Unknown constructor layout: {}", s)),
        }
    }
}

impl std::fmt::Display for CtorLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CtorLayout::AdminImpl => write!(f, "admin-impl"),
            CtorLayout::AdminImplData => write!(f, "admin-impl-data"),
        }
    }
}

/// Left-pads an address into a 32-byte ABI word.
#[inline]
fn address_word(addr: &[u8; 20]) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(addr);
    word
}

/// ABI-encodes the proxy constructor arguments for `layout`.
///
/// The dynamic `bytes` argument of [`CtorLayout::AdminImplData`] is always
/// empty: an offset word of `0x60` followed by a zero length word.
pub fn encode_constructor_args(
    layout: CtorLayout,
    deployer: &[u8; 20],
    implementation: &[u8; 20],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(layout.encoded_len());
    out.extend_from_slice(&address_word(deployer));
    out.extend_from_slice(&address_word(implementation));
    if layout == CtorLayout::AdminImplData {
        let mut trailer = [0u8; 64];
        trailer[31] = 0x60;
        out.extend_from_slice(&trailer);
    }
    out
}

/// keccak256(bytecode || args)
pub fn init_code_hash(bytecode: &[u8], args: &[u8]) -> [u8; 32] {
    let mut init_code = Vec::with_capacity(bytecode.len() + args.len());
    init_code.extend_from_slice(bytecode);
    init_code.extend_from_slice(args);
    keccak256(&init_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BYTECODE: &str = "6080604052600080fdfe";

    fn addr(last: u8) -> [u8; 20] {
        let mut a = [0u8; 20];
        a[19] = last;
        a
    }

    #[test]
    fn test_two_arg_encoding() {
        let args = encode_constructor_args(CtorLayout::AdminImpl, &addr(1), &addr(2));
        assert_eq!(args.len(), 64);
        assert_eq!(args[31], 1);
        assert_eq!(args[63], 2);
        assert!(args[..31].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_three_arg_encoding() {
        let args = encode_constructor_args(CtorLayout::AdminImplData, &addr(1), &addr(2));
        assert_eq!(args.len(), 128);
        assert_eq!(args[95], 0x60);
        assert!(args[96..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_init_code_hash_vectors() {
        let bytecode = hex::decode(BYTECODE).unwrap();
        let three = encode_constructor_args(CtorLayout::AdminImplData, &addr(1), &addr(2));
        let two = encode_constructor_args(CtorLayout::AdminImpl, &addr(1), &addr(2));
        assert_eq!(
            hex::encode(init_code_hash(&bytecode, &three)),
            "84ba8f3eec32cf4ce481d6000d663de9595fe3509b34380b955573a5cfb263ba"
        );
        assert_eq!(
            hex::encode(init_code_hash(&bytecode, &two)),
            "6bab094b63ec36ae80a1e09a4b433bebc49be948110f612d0890f56a3b78758d"
        );
    }

    #[test]
    fn test_init_code_hash_is_pure() {
        let bytecode = hex::decode(BYTECODE).unwrap();
        let args = encode_constructor_args(CtorLayout::AdminImplData, &addr(7), &addr(9));
        assert_eq!(init_code_hash(&bytecode, &args), init_code_hash(&bytecode, &args));
    }

    #[test]
    fn test_layout_parse() {
        assert_eq!("admin-impl".parse::<CtorLayout>(), Ok(CtorLayout::AdminImpl));
        assert_eq!(
            "Admin-Impl-Data".parse::<CtorLayout>(),
            Ok(CtorLayout::AdminImplData)
        );
        assert!("3".parse::<CtorLayout>().is_err());
        assert_eq!(CtorLayout::AdminImplData.to_string(), "admin-impl-data");
    }
}
