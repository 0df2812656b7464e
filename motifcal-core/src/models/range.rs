use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::MotifCalError;

/// Tolerance used when comparing scores against candidate cutoffs.
pub const SCORE_EPSILON: f64 = 1e-9;

/// Upper limit on the number of candidate cutoffs a range may produce.
pub const MAX_CANDIDATES: f64 = 1e6;

///
/// Inclusive range of candidate score cutoffs, written `low:high` (step 1)
/// or `low:step:high`.
///
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScanRange {
    pub low: f64,
    pub high: f64,
    pub step: f64,
}

impl ScanRange {
    pub fn new(low: f64, high: f64, step: f64) -> Result<Self, MotifCalError> {
        if !(low.is_finite() && high.is_finite() && step.is_finite()) {
            return Err(MotifCalError::configuration(
                "range bounds must be finite numbers",
            ));
        }
        if low >= high {
            return Err(MotifCalError::Configuration(format!(
                "range lower bound {} must be below upper bound {}",
                low, high
            )));
        }
        if step <= 0.0 {
            return Err(MotifCalError::Configuration(format!(
                "range step must be positive, got {}",
                step
            )));
        }
        let count = (high - low) / step + 1.0;
        if count > MAX_CANDIDATES {
            return Err(MotifCalError::Configuration(format!(
                "range {}:{}:{} yields {:.0} candidate cutoffs, at most {} allowed",
                low, step, high, count, MAX_CANDIDATES
            )));
        }
        Ok(Self { low, high, step })
    }

    /// Candidate cutoffs from `low` to `high`, both inclusive.
    pub fn candidates(&self) -> Vec<f64> {
        let n = ((self.high - self.low) / self.step + SCORE_EPSILON).floor() as usize;
        let mut cutoffs: Vec<f64> = (0..=n)
            .map(|i| round_score(self.low + i as f64 * self.step))
            .collect();
        if let Some(last) = cutoffs.last() {
            if (self.high - last).abs() > SCORE_EPSILON {
                cutoffs.push(self.high);
            }
        }
        cutoffs
    }

    pub fn contains(&self, score: f64) -> bool {
        score >= self.low - SCORE_EPSILON && score <= self.high + SCORE_EPSILON
    }
}

fn round_score(value: f64) -> f64 {
    (value * 1e9).round() / 1e9
}

impl FromStr for ScanRange {
    type Err = MotifCalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(':')
            .map(|p| {
                p.trim().parse::<f64>().map_err(|_| {
                    MotifCalError::Configuration(format!("invalid range value '{}' in '{}'", p, s))
                })
            })
            .collect::<Result<Vec<f64>, MotifCalError>>()?;

        match parts.as_slice() {
            [low, high] => ScanRange::new(*low, *high, 1.0),
            [low, step, high] => ScanRange::new(*low, *high, *step),
            _ => Err(MotifCalError::Configuration(format!(
                "range must be low:high or low:step:high, got '{}'",
                s
            ))),
        }
    }
}

impl Display for ScanRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.low, self.step, self.high)
    }
}
