use std::fmt::{self, Display};
use std::str::FromStr;

use crate::models::sequence::SetKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn as_char(&self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Strand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" | "1" | "+1" => Ok(Strand::Forward),
            "-" | "-1" => Ok(Strand::Reverse),
            _ => Err(format!("Invalid strand: {}", s)),
        }
    }
}

///
/// One raw match reported by a scanning engine, normalized to 0-based,
/// half-open offsets in the forward frame of the scanned sequence.
///
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchRecord {
    pub motif_id: String,
    pub sequence_id: String,
    pub kind: SetKind,
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
    pub score: f64,
}

impl MatchRecord {
    pub fn width(&self) -> u64 {
        self.end - self.start
    }
}
