pub mod center;
pub mod hit;
pub mod matches;
pub mod motif;
pub mod range;
pub mod sequence;

// re-export for cleaner imports
pub use self::center::{CenterTable, DEFAULT_CENTER_COLUMNS, PeakCenter};
pub use self::hit::{ClassifiedHit, Cutoff, CutoffStatus, GenomicCoordinates};
pub use self::matches::{MatchRecord, Strand};
pub use self::motif::{Motif, MotifSet};
pub use self::range::{SCORE_EPSILON, ScanRange};
pub use self::sequence::{SequenceRecord, SequenceSet, SetKind};
