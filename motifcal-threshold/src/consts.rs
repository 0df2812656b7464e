pub const DEFAULT_FPR: f64 = 0.05;
pub const DEFAULT_TIMES: usize = 10;
pub const DEFAULT_LENGTH: usize = 400;
pub const DEFAULT_BESTHIT: usize = 1;

pub const STATS_FILE: &str = "stats.tsv";
pub const CUTOFFS_FILE: &str = "cutoffs.tsv";
pub const SUMMARY_FILE: &str = "summary.json";
pub const BACKGROUND_SAMPLE_FILE: &str = "background.sampled.fa";

pub const GFF_SOURCE: &str = "motifcal";
pub const GFF_FEATURE_TYPE: &str = "TF_binding_site";
