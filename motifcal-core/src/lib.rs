//! Core data model for motifcal.
//!
//! This crate holds the types shared by the calibration engine and the CLI:
//!
//! - [`models::Motif`] / [`models::MotifSet`]: positional weight matrices parsed from MEME,
//!   JASPAR or plain PWM files
//! - [`models::SequenceSet`]: FASTA-backed input and background sequence sets
//! - [`models::MatchRecord`]: one normalized match from a scanning engine
//! - [`models::ScanRange`], [`models::Cutoff`], [`models::ClassifiedHit`]: calibration and
//!   classification results
//! - [`models::CenterTable`]: peak summit / extension metadata for coordinate projection
//!
//! Fatal problems are reported as [`errors::MotifCalError`]; non-fatal conditions as
//! [`warnings::PipelineWarning`].
pub mod errors;
pub mod models;
pub mod utils;
pub mod warnings;

pub use errors::{MotifCalError, Result};
pub use warnings::PipelineWarning;
