//! Chain primitives: addresses, game IDs, raw call data

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::utils::{ParseError, bigint_to_hex, bytes_to_hex, hex_to_bytes, parse_bigint, strip_hex_prefix};

/// One 32-byte ABI word
pub type Word = [u8; 32];

/// A 20-byte account or contract address
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0; 20]);

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ParseError::InvalidAddress {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let digits = strip_hex_prefix(s).ok_or_else(|| invalid("missing 0x prefix"))?;
        if digits.len() != 40 {
            return Err(invalid("expected 40 hex digits"));
        }

        let bytes = hex_to_bytes(digits).map_err(|_| invalid("not hex"))?;
        let mut out = [0u8; 20];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl TryFrom<String> for Address {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", bytes_to_hex(&self.0))
    }
}

/// On-chain game identifier (a uint256 that fits in 128 bits in practice)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameId(pub u128);

impl GameId {
    pub fn to_word(self) -> Word {
        word_from_u128(self.0)
    }

    pub fn to_hex(self) -> String {
        format!("0x{}", bigint_to_hex(self.0, None))
    }
}

impl FromStr for GameId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_bigint(s).map(GameId)
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw return data of a contract call, left undecoded
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CallOutput(pub Vec<u8>);

impl CallOutput {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Splits the data into 32-byte words; a trailing partial word is dropped
    pub fn words(&self) -> impl Iterator<Item = &[u8]> {
        self.0.chunks_exact(32)
    }
}

impl FromStr for CallOutput {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex_to_bytes(s).map(CallOutput)
    }
}

impl fmt::Display for CallOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", bytes_to_hex(&self.0))
    }
}

/// Returns the 4-byte function selector for a signature like `getCards(uint256)`
pub fn selector(signature: &str) -> [u8; 4] {
    let mut hasher = Keccak256::new();
    hasher.update(signature.as_bytes());
    let hash = hasher.finalize();

    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// Builds calldata: selector followed by the static arguments
pub fn encode_call(signature: &str, args: &[Word]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + 32 * args.len());
    data.extend_from_slice(&selector(signature));
    for word in args {
        data.extend_from_slice(word);
    }
    data
}

pub fn word_from_u128(n: u128) -> Word {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&n.to_be_bytes());
    word
}

pub fn word_from_address(address: &Address) -> Word {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}
