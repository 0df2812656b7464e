use std::collections::{BTreeMap, HashMap};

use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;

use motifcal_core::errors::MotifCalError;
use motifcal_core::models::{Cutoff, CutoffStatus, MatchRecord, SCORE_EPSILON, ScanRange};
use motifcal_core::PipelineWarning;

use crate::context::RunContext;

/// Calibrated cutoffs keyed by motif id.
pub type CutoffTable = BTreeMap<String, Cutoff>;

/// Empirical background FPR at one candidate cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FprPoint {
    pub cutoff: f64,
    pub fpr: f64,
}

/// Result of calibrating one motif: its cutoff, the FPR curve it was picked from and any warning.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    pub cutoff: Cutoff,
    pub curve: Vec<FprPoint>,
    pub warning: Option<PipelineWarning>,
}

///
/// Picks, per motif, the smallest cutoff in the scan range whose background
/// FPR does not exceed the target.
///
#[derive(Debug, Clone)]
pub struct ThresholdCalibrator {
    pub range: ScanRange,
    pub target_fpr: f64,
    pub just_scan: bool,
}

impl ThresholdCalibrator {
    pub fn new(range: ScanRange, target_fpr: f64, just_scan: bool) -> Result<Self, MotifCalError> {
        if !(target_fpr > 0.0 && target_fpr <= 1.0) {
            return Err(MotifCalError::Configuration(format!(
                "fpr must be in (0, 1], got {}",
                target_fpr
            )));
        }
        Ok(Self {
            range,
            target_fpr,
            just_scan,
        })
    }

    ///
    /// Background FPR at every candidate cutoff: the share of background
    /// sequences with at least one match scoring >= the cutoff.
    ///
    pub fn fpr_curve(
        &self,
        matches: &[MatchRecord],
        n_background: usize,
    ) -> Result<Vec<FprPoint>, MotifCalError> {
        if n_background == 0 {
            return Err(MotifCalError::configuration(
                "background sample is empty, cannot estimate FPR",
            ));
        }

        let mut best_per_sequence: HashMap<&str, f64> = HashMap::new();
        for record in matches {
            best_per_sequence
                .entry(record.sequence_id.as_str())
                .and_modify(|best| *best = best.max(record.score))
                .or_insert(record.score);
        }

        if best_per_sequence.len() > n_background {
            return Err(MotifCalError::Configuration(format!(
                "background matches cover {} sequences but the background sample has only {}",
                best_per_sequence.len(),
                n_background
            )));
        }

        let mut best: Vec<f64> = best_per_sequence.into_values().collect();
        best.sort_by(|a, b| a.total_cmp(b));

        let curve = self
            .range
            .candidates()
            .into_iter()
            .map(|cutoff| {
                let below = best.partition_point(|s| *s < cutoff - SCORE_EPSILON);
                FprPoint {
                    cutoff,
                    fpr: (best.len() - below) as f64 / n_background as f64,
                }
            })
            .collect();

        Ok(curve)
    }

    pub fn calibrate_motif(
        &self,
        motif_id: &str,
        matches: &[MatchRecord],
        n_background: usize,
    ) -> Result<Calibration, MotifCalError> {
        let cutoff = |score: f64, achieved: Option<f64>, status: CutoffStatus| Cutoff {
            motif_id: motif_id.to_string(),
            score,
            target_fpr: self.target_fpr,
            achieved_fpr: achieved,
            background_sequences: n_background,
            status,
        };

        if self.just_scan {
            return Ok(Calibration {
                cutoff: cutoff(self.range.low, None, CutoffStatus::JustScan),
                curve: Vec::new(),
                warning: None,
            });
        }

        let curve = self.fpr_curve(matches, n_background)?;

        if matches.is_empty() {
            return Ok(Calibration {
                cutoff: cutoff(self.range.high, Some(0.0), CutoffStatus::NoBackgroundMatches),
                curve,
                warning: Some(PipelineWarning::NoBackgroundMatches {
                    motif: motif_id.to_string(),
                    cutoff: self.range.high,
                }),
            });
        }

        // the curve is non-increasing, so the first qualifying point is the smallest cutoff
        let selected = curve
            .iter()
            .find(|point| point.fpr <= self.target_fpr + SCORE_EPSILON)
            .copied();

        let calibration = match selected {
            Some(point) => {
                debug!(
                    "Motif {}: cutoff {} (FPR {:.4} <= {})",
                    motif_id, point.cutoff, point.fpr, self.target_fpr
                );
                Calibration {
                    cutoff: cutoff(point.cutoff, Some(point.fpr), CutoffStatus::Ok),
                    curve,
                    warning: None,
                }
            }
            None => {
                let achieved = curve.last().map(|p| p.fpr).unwrap_or(1.0);
                Calibration {
                    cutoff: cutoff(self.range.high, Some(achieved), CutoffStatus::NotAchieved),
                    curve,
                    warning: Some(PipelineWarning::ThresholdNotAchieved {
                        motif: motif_id.to_string(),
                        target: self.target_fpr,
                        achieved,
                        cutoff: self.range.high,
                    }),
                }
            }
        };

        Ok(calibration)
    }

    ///
    /// Calibrate every motif in parallel. Motifs absent from `background`
    /// are calibrated on an empty match set. Warnings go to the run context.
    ///
    pub fn calibrate_all(
        &self,
        motif_ids: &[&str],
        background: &BTreeMap<String, Vec<MatchRecord>>,
        n_background: usize,
        ctx: &RunContext,
    ) -> Result<CutoffTable, MotifCalError> {
        info!(
            "Calibrating {} motifs against {} background sequences (target FPR {})",
            motif_ids.len(),
            n_background,
            self.target_fpr
        );

        let calibrations = motif_ids
            .par_iter()
            .map(|id| {
                let matches = background.get(*id).map(Vec::as_slice).unwrap_or(&[]);
                self.calibrate_motif(id, matches, n_background)
            })
            .collect::<Result<Vec<_>, MotifCalError>>()?;

        let mut table = CutoffTable::new();
        for calibration in calibrations {
            if let Some(warning) = calibration.warning {
                ctx.warn(warning);
            }
            table.insert(calibration.cutoff.motif_id.clone(), calibration.cutoff);
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use motifcal_core::models::{SetKind, Strand};
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::str::FromStr;

    fn hit(seq: &str, score: f64) -> MatchRecord {
        MatchRecord {
            motif_id: "m1".to_string(),
            sequence_id: seq.to_string(),
            kind: SetKind::Background,
            start: 0,
            end: 8,
            strand: Strand::Forward,
            score,
        }
    }

    /// 50 background sequences whose best scores give FPRs
    /// [0.9, 0.7, 0.5, 0.3, 0.2, 0.1, 0.06, 0.04, 0.02, 0.0] at cutoffs 0.1..1.0.
    #[fixture]
    fn stepped_background() -> Vec<MatchRecord> {
        let per_score = [
            (0.1, 10),
            (0.2, 10),
            (0.3, 10),
            (0.4, 5),
            (0.5, 5),
            (0.6, 2),
            (0.7, 1),
            (0.8, 1),
            (0.9, 1),
        ];
        let mut matches = Vec::new();
        let mut n = 0;
        for (score, count) in per_score {
            for _ in 0..count {
                matches.push(hit(&format!("bg{}", n), score));
                // weaker secondary hit on the same sequence must not count twice
                matches.push(hit(&format!("bg{}", n), 0.1));
                n += 1;
            }
        }
        matches
    }

    fn calibrator(fpr: f64) -> ThresholdCalibrator {
        ThresholdCalibrator::new(ScanRange::from_str("0.1:0.1:1").unwrap(), fpr, false).unwrap()
    }

    #[rstest]
    fn test_fpr_curve(stepped_background: Vec<MatchRecord>) {
        let curve = calibrator(0.05).fpr_curve(&stepped_background, 50).unwrap();
        let fprs: Vec<f64> = curve.iter().map(|p| (p.fpr * 100.0).round() / 100.0).collect();
        assert_eq!(
            fprs,
            vec![0.9, 0.7, 0.5, 0.3, 0.2, 0.1, 0.06, 0.04, 0.02, 0.0]
        );
    }

    #[rstest]
    fn test_selects_first_cutoff_under_target(stepped_background: Vec<MatchRecord>) {
        let calibration = calibrator(0.05)
            .calibrate_motif("m1", &stepped_background, 50)
            .unwrap();
        assert_eq!(calibration.cutoff.score, 0.8);
        assert_eq!(calibration.cutoff.status, CutoffStatus::Ok);
        assert_eq!(calibration.cutoff.achieved_fpr, Some(0.04));
        assert_eq!(calibration.warning, None);
    }

    #[rstest]
    fn test_cutoff_monotonic_in_fpr(stepped_background: Vec<MatchRecord>) {
        let targets = [0.01, 0.02, 0.05, 0.1, 0.25, 0.5, 0.95];
        let cutoffs: Vec<f64> = targets
            .iter()
            .map(|f| {
                calibrator(*f)
                    .calibrate_motif("m1", &stepped_background, 50)
                    .unwrap()
                    .cutoff
                    .score
            })
            .collect();
        for pair in cutoffs.windows(2) {
            assert!(pair[0] >= pair[1], "cutoffs not monotonic: {:?}", cutoffs);
        }
    }

    #[rstest]
    fn test_no_background_matches() {
        let calibration = calibrator(0.05).calibrate_motif("m1", &[], 50).unwrap();
        assert_eq!(calibration.cutoff.score, 1.0);
        assert_eq!(calibration.cutoff.status, CutoffStatus::NoBackgroundMatches);
        assert!(!matches!(
            calibration.warning,
            Some(PipelineWarning::ThresholdNotAchieved { .. })
        ));
    }

    #[rstest]
    fn test_threshold_not_achieved() {
        let matches: Vec<MatchRecord> = (0..20).map(|i| hit(&format!("bg{}", i), 1.0)).collect();
        let calibration = calibrator(0.05).calibrate_motif("m1", &matches, 20).unwrap();
        assert_eq!(calibration.cutoff.score, 1.0);
        assert_eq!(calibration.cutoff.status, CutoffStatus::NotAchieved);
        assert!(matches!(
            calibration.warning,
            Some(PipelineWarning::ThresholdNotAchieved { achieved, .. }) if achieved == 1.0
        ));
    }

    #[rstest]
    fn test_just_scan_uses_lower_bound() {
        let calibrator =
            ThresholdCalibrator::new(ScanRange::from_str("3:12").unwrap(), 0.05, true).unwrap();
        let calibration = calibrator.calibrate_motif("m1", &[], 0).unwrap();
        assert_eq!(calibration.cutoff.score, 3.0);
        assert_eq!(calibration.cutoff.status, CutoffStatus::JustScan);
    }

    #[rstest]
    #[case(0.0)]
    #[case(1.5)]
    #[case(f64::NAN)]
    fn test_invalid_fpr(#[case] fpr: f64) {
        let range = ScanRange::from_str("0:1").unwrap();
        assert!(ThresholdCalibrator::new(range, fpr, false).is_err());
    }

    #[rstest]
    fn test_more_hit_sequences_than_background(stepped_background: Vec<MatchRecord>) {
        let result = calibrator(0.05).calibrate_motif("m1", &stepped_background, 10);
        assert!(matches!(result, Err(MotifCalError::Configuration(_))));
    }

    #[rstest]
    fn test_calibrate_all_is_deterministic(stepped_background: Vec<MatchRecord>) {
        let ctx = RunContext::new(Some(1)).unwrap();
        let mut background = BTreeMap::new();
        background.insert("m1".to_string(), stepped_background);
        let ids = ["m1", "m2"];
        let first = calibrator(0.05)
            .calibrate_all(&ids, &background, 50, &ctx)
            .unwrap();
        let second = calibrator(0.05)
            .calibrate_all(&ids, &background, 50, &ctx)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first["m1"].score, 0.8);
        assert_eq!(first["m2"].status, CutoffStatus::NoBackgroundMatches);
    }
}
