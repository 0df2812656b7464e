use thiserror::Error;

/// Fatal errors raised while loading inputs or preparing a calibration run.
#[derive(Error, Debug)]
pub enum MotifCalError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(
        "Insufficient background: {required} sequences of length >= {length} required, {available} usable in pool"
    )]
    InsufficientBackground {
        required: usize,
        available: usize,
        length: usize,
    },

    #[error("Scanner adapter error ({source_name}, line {line}): {reason}")]
    ScannerAdapter {
        source_name: String,
        line: usize,
        reason: String,
    },

    #[error("Error parsing motif file: {0}")]
    MotifParse(String),

    #[error("Error parsing sequence file: {0}")]
    SequenceParse(String),

    #[error("Error parsing center table: {0}")]
    CenterParse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MotifCalError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        MotifCalError::Configuration(msg.into())
    }

    pub fn adapter(source_name: impl Into<String>, line: usize, reason: impl Into<String>) -> Self {
        MotifCalError::ScannerAdapter {
            source_name: source_name.into(),
            line,
            reason: reason.into(),
        }
    }

    /// Fatal errors abort the run. Adapter errors only abort the affected
    /// (motif, sequence-set) pair.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, MotifCalError::ScannerAdapter { .. })
    }
}

pub type Result<T> = std::result::Result<T, MotifCalError>;
