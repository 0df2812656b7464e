use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use log::warn;
use tempfile::TempDir;

use motifcal_core::PipelineWarning;

///
/// Per-run state shared by all pipeline components: the scoped working
/// directory, the random seed and the warning collector.
///
/// The working directory is removed when the context is dropped, on normal
/// return, on error and on panic unwinding alike.
///
#[derive(Debug)]
pub struct RunContext {
    workdir: TempDir,
    seed: u64,
    warnings: Mutex<Vec<PipelineWarning>>,
}

impl RunContext {
    /// Create a context; without an explicit seed a fresh one is drawn.
    pub fn new(seed: Option<u64>) -> Result<Self> {
        let workdir = tempfile::Builder::new()
            .prefix("motifcal-")
            .tempdir()
            .context("Failed to create temporary working directory")?;
        Ok(Self::with_workdir(workdir, seed))
    }

    pub fn with_workdir(workdir: TempDir, seed: Option<u64>) -> Self {
        Self {
            workdir,
            seed: seed.unwrap_or_else(rand::random::<u64>),
            warnings: Mutex::new(Vec::new()),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }

    pub fn temp_path(&self, name: &str) -> PathBuf {
        self.workdir.path().join(name)
    }

    /// Log and record a warning.
    pub fn warn(&self, warning: PipelineWarning) {
        warn!("{}", warning);
        match self.warnings.lock() {
            Ok(mut warnings) => warnings.push(warning),
            Err(poisoned) => poisoned.into_inner().push(warning),
        }
    }

    pub fn warn_all(&self, warnings: impl IntoIterator<Item = PipelineWarning>) {
        for warning in warnings {
            self.warn(warning);
        }
    }

    pub fn warnings(&self) -> Vec<PipelineWarning> {
        match self.warnings.lock() {
            Ok(warnings) => warnings.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_workdir_removed_on_drop() {
        let ctx = RunContext::new(Some(7)).unwrap();
        let dir = ctx.workdir().to_path_buf();
        std::fs::write(ctx.temp_path("scratch.fa"), ">a\nACGT\n").unwrap();
        assert!(dir.exists());
        drop(ctx);
        assert!(!dir.exists());
    }

    #[rstest]
    fn test_explicit_seed_kept() {
        let ctx = RunContext::new(Some(42)).unwrap();
        assert_eq!(ctx.seed(), 42);
    }

    #[rstest]
    fn test_warnings_collected() {
        let ctx = RunContext::new(None).unwrap();
        ctx.warn(PipelineWarning::NoBackgroundMatches {
            motif: "m1".to_string(),
            cutoff: 10.0,
        });
        assert_eq!(ctx.warnings().len(), 1);
    }
}
