use std::fmt::{self, Display};
use std::str::FromStr;

use crate::models::matches::MatchRecord;

/// How a motif's cutoff was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CutoffStatus {
    Ok,
    NotAchieved,
    NoBackgroundMatches,
    JustScan,
}

impl Display for CutoffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CutoffStatus::Ok => "ok",
            CutoffStatus::NotAchieved => "not_achieved",
            CutoffStatus::NoBackgroundMatches => "no_background_matches",
            CutoffStatus::JustScan => "justscan",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for CutoffStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(CutoffStatus::Ok),
            "not_achieved" => Ok(CutoffStatus::NotAchieved),
            "no_background_matches" => Ok(CutoffStatus::NoBackgroundMatches),
            "justscan" => Ok(CutoffStatus::JustScan),
            _ => Err(format!("Invalid cutoff status: {}", s)),
        }
    }
}

///
/// Calibrated score threshold of one motif.
///
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cutoff {
    pub motif_id: String,
    pub score: f64,
    pub target_fpr: f64,
    /// Empirical background FPR at `score`; `None` in just-scan mode.
    pub achieved_fpr: Option<f64>,
    pub background_sequences: usize,
    pub status: CutoffStatus,
}

impl Cutoff {
    pub fn passes(&self, score: f64) -> bool {
        score >= self.score - crate::models::range::SCORE_EPSILON
    }
}

/// Absolute genome placement of a hit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenomicCoordinates {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    /// False when coordinates are only relative to the sequence start.
    pub precise: bool,
}

///
/// A match that passed its motif's cutoff. `rank` is 1-based within its
/// (motif, sequence) pair.
///
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassifiedHit {
    pub record: MatchRecord,
    pub rank: usize,
    pub coordinates: Option<GenomicCoordinates>,
}

impl ClassifiedHit {
    pub fn new(record: MatchRecord, rank: usize) -> Self {
        Self {
            record,
            rank,
            coordinates: None,
        }
    }

    pub fn motif_id(&self) -> &str {
        &self.record.motif_id
    }

    pub fn sequence_id(&self) -> &str {
        &self.record.sequence_id
    }

    pub fn score(&self) -> f64 {
        self.record.score
    }
}
