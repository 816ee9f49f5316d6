//! Memory budget configuration and parsing.
//!
//! A [`MemoryBudget`] is the ceiling on the total footprint of resident
//! pictures. It parses human-readable sizes so the same value can come from
//! the command line, the environment, or a config file.

use std::fmt;

use serde::{Deserialize, Serialize};

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

/// Error returned when a budget string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseBudgetError {
    #[error("budget is empty")]
    Empty,

    #[error("invalid budget '{0}': expected a number followed by an optional suffix (K, M, G)")]
    Invalid(String),

    #[error("budget '{0}' overflows")]
    Overflow(String),

    #[error("budget must be greater than zero")]
    Zero,
}

/// Maximum total footprint of simultaneously resident pictures.
///
/// # Parsing
/// - `"512M"` or `"512MB"` → 512 × 1024² bytes
/// - `"1G"` or `"1GB"` → 1024³ bytes
/// - `"2048K"` or `"2048KB"` → 2048 × 1024 bytes
/// - `"60000"` or `"60000B"` → raw byte count
///
/// # Examples
/// ```
/// use gallery_cache::MemoryBudget;
///
/// let b = MemoryBudget::parse("60000").unwrap();
/// assert_eq!(b.as_bytes(), 60_000);
///
/// let b = MemoryBudget::parse("1G").unwrap();
/// assert_eq!(b.as_mb(), 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "BudgetRepr", into = "u64")]
pub struct MemoryBudget {
    bytes: u64,
}

impl MemoryBudget {
    pub fn from_bytes(bytes: u64) -> Self {
        Self { bytes }
    }

    pub fn from_mb(mb: u64) -> Self {
        Self {
            bytes: mb.saturating_mul(MB),
        }
    }

    pub fn from_gb(gb: u64) -> Self {
        Self {
            bytes: gb.saturating_mul(GB),
        }
    }

    pub fn as_bytes(&self) -> u64 {
        self.bytes
    }

    /// Budget in megabytes (truncated)
    pub fn as_mb(&self) -> u64 {
        self.bytes / MB
    }

    /// Parses a human-readable budget string. Case-insensitive.
    pub fn parse(s: &str) -> Result<Self, ParseBudgetError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseBudgetError::Empty);
        }

        let upper = s.to_ascii_uppercase();
        let (digits, multiplier) = [
            ("GB", GB),
            ("G", GB),
            ("MB", MB),
            ("M", MB),
            ("KB", KB),
            ("K", KB),
            ("B", 1),
        ]
        .iter()
        .find_map(|(suffix, mult)| upper.strip_suffix(suffix).map(|rest| (rest, *mult)))
        .unwrap_or((upper.as_str(), 1));

        let value: u64 = digits
            .trim()
            .parse()
            .map_err(|_| ParseBudgetError::Invalid(s.to_string()))?;

        let bytes = value
            .checked_mul(multiplier)
            .ok_or_else(|| ParseBudgetError::Overflow(s.to_string()))?;

        if bytes == 0 {
            return Err(ParseBudgetError::Zero);
        }

        Ok(Self { bytes })
    }
}

impl std::str::FromStr for MemoryBudget {
    type Err = ParseBudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MemoryBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bytes >= GB && self.bytes % GB == 0 {
            write!(f, "{} GB", self.bytes / GB)
        } else if self.bytes >= MB && self.bytes % MB == 0 {
            write!(f, "{} MB", self.bytes / MB)
        } else if self.bytes >= KB && self.bytes % KB == 0 {
            write!(f, "{} KB", self.bytes / KB)
        } else {
            write!(f, "{} B", self.bytes)
        }
    }
}

impl From<MemoryBudget> for u64 {
    fn from(budget: MemoryBudget) -> Self {
        budget.bytes
    }
}

/// Config files may give the budget as a byte count or a size string.
#[derive(Deserialize)]
#[serde(untagged)]
enum BudgetRepr {
    Bytes(u64),
    Text(String),
}

impl TryFrom<BudgetRepr> for MemoryBudget {
    type Error = ParseBudgetError;

    fn try_from(repr: BudgetRepr) -> Result<Self, Self::Error> {
        match repr {
            BudgetRepr::Bytes(0) => Err(ParseBudgetError::Zero),
            BudgetRepr::Bytes(bytes) => Ok(Self::from_bytes(bytes)),
            BudgetRepr::Text(text) => Self::parse(&text),
        }
    }
}
