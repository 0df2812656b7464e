//! # Motif threshold calibration and match classification
//!
//! Calibrates a per-motif score cutoff against a sampled background so that at most a target
//! fraction of background sequences carries a match, then applies those cutoffs to the matches of
//! real sequence sets, ranks them per sequence, projects them onto genome coordinates and renders
//! the results.
//!
//! Scanning itself is done by an external PWM scanner (FIMO or pwm_scan); its output enters
//! through a [ScannerAdapter].
//!
//! ```no_run
//! use motifcal_threshold::{PipelineConfig, RunContext, run};
//! use std::path::Path;
//!
//! let config = PipelineConfig::from_path(Path::new("motifcal.yaml")).unwrap();
//! let ctx = RunContext::new(config.seed).unwrap();
//! let output = run(&config, &ctx).unwrap();
//! println!("{} motifs calibrated", output.cutoffs.len());
//! ```
pub mod adapters;
pub mod calibrator;
pub mod classifier;
pub mod config;
pub mod consts;
pub mod context;
pub mod counts;
pub mod pipeline;
pub mod projector;
pub mod report;
pub mod sampler;

// re-exports
pub use adapters::*;
pub use calibrator::*;
pub use classifier::*;
pub use config::*;
pub use context::*;
pub use counts::*;
pub use pipeline::*;
pub use projector::*;
pub use sampler::*;
