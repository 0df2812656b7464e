use thiserror::Error;

/// Non-fatal conditions recorded during a run and reported next to the
/// regular output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineWarning {
    #[error(
        "Motif {motif}: target FPR {target} not achieved in scan range (best FPR {achieved:.4} at cutoff {cutoff})"
    )]
    ThresholdNotAchieved {
        motif: String,
        target: f64,
        achieved: f64,
        cutoff: f64,
    },

    #[error("Motif {motif}: no matches on background, using strictest cutoff {cutoff}")]
    NoBackgroundMatches { motif: String, cutoff: f64 },

    #[error(
        "Background pool has {available} usable sequences for {requested} requested, sampled with replacement"
    )]
    SamplingWithReplacement { requested: usize, available: usize },

    #[error("Motif {motif} on {sequence}: coordinates are relative to the sequence ({reason})")]
    ImpreciseCoordinates {
        motif: String,
        sequence: String,
        reason: String,
    },

    #[error("Skipping motif {motif} on {set}: {reason}")]
    ScannerAdapter {
        motif: String,
        set: String,
        reason: String,
    },

    #[error("Motif {motif} has matches in {set} but no calibrated cutoff")]
    MissingCutoff { motif: String, set: String },
}
