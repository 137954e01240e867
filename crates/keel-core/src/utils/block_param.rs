//! Block parameter handling for outgoing requests.
//!
//! Provides one place that turns a block reference into the JSON-RPC parameter
//! form and picks the matching `eth_getBlockBy*` method.

use std::{fmt, str::FromStr};
use thiserror::Error;

use super::quantity::{format_hex_u64, parse_u64};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid block reference: {0}")]
pub struct ParseError(String);

/// Standard Ethereum block tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    /// The most recent block in the canonical chain
    Latest,
    /// The earliest/genesis block
    Earliest,
    /// A block in the pending state
    Pending,
    /// The most recent safe head block
    Safe,
    /// The most recent finalized block
    Finalized,
}

impl BlockTag {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Earliest => "earliest",
            Self::Pending => "pending",
            Self::Safe => "safe",
            Self::Finalized => "finalized",
        }
    }
}

/// Reference to a block by number, tag or hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockId {
    Number(u64),
    Tag(BlockTag),
    Hash(String),
}

impl BlockId {
    /// Shorthand for `BlockId::Tag(BlockTag::Latest)`.
    #[must_use]
    pub fn latest() -> Self {
        Self::Tag(BlockTag::Latest)
    }

    /// Returns the JSON-RPC parameter form (`"0x10"`, `"latest"`, or the hash).
    #[must_use]
    pub fn to_param(&self) -> String {
        match self {
            Self::Number(n) => format_hex_u64(*n),
            Self::Tag(tag) => tag.as_str().to_string(),
            Self::Hash(hash) => hash.clone(),
        }
    }

    /// Returns the block retrieval method for this reference.
    #[must_use]
    pub fn block_method(&self) -> &'static str {
        match self {
            Self::Hash(_) => "eth_getBlockByHash",
            Self::Number(_) | Self::Tag(_) => "eth_getBlockByNumber",
        }
    }
}

impl From<u64> for BlockId {
    fn from(number: u64) -> Self {
        Self::Number(number)
    }
}

impl From<BlockTag> for BlockId {
    fn from(tag: BlockTag) -> Self {
        Self::Tag(tag)
    }
}

impl FromStr for BlockId {
    type Err = ParseError;

    /// Accepts a tag, a decimal or `0x` number, or a 32-byte `0x` hash.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = match s {
            "latest" => Some(BlockTag::Latest),
            "earliest" => Some(BlockTag::Earliest),
            "pending" => Some(BlockTag::Pending),
            "safe" => Some(BlockTag::Safe),
            "finalized" => Some(BlockTag::Finalized),
            _ => None,
        };
        if let Some(tag) = tag {
            return Ok(Self::Tag(tag));
        }

        // 0x + 64 hex chars
        if s.len() == 66 && s.starts_with("0x") {
            return if s[2..].bytes().all(|b| b.is_ascii_hexdigit()) {
                Ok(Self::Hash(s.to_string()))
            } else {
                Err(ParseError(s.to_string()))
            };
        }

        parse_u64(s).map(Self::Number).map_err(|_| ParseError(s.to_string()))
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Tag(tag) => f.write_str(tag.as_str()),
            Self::Hash(hash) => f.write_str(hash),
        }
    }
}
