use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;

use motifcal_core::models::{SequenceSet, SetKind};
use motifcal_threshold::consts::CUTOFFS_FILE;
use motifcal_threshold::report::write_cutoffs;
use motifcal_threshold::{PipelineConfig, RunContext, calibrate, load_motifs, prepare_background};

use crate::options::apply_overrides;

pub fn run_calibrate(matches: &ArgMatches) -> Result<()> {
    let mut config = PipelineConfig::default();
    apply_overrides(&mut config, matches)?;
    let output = matches
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(CUTOFFS_FILE));

    if !config.justscan && config.background_sample.is_none() {
        anyhow::bail!("--background is required unless --justscan is set");
    }

    let motif_path = config.motif.clone().context("A motif file is required.")?;
    let motifs = load_motifs(&motif_path)?;

    let mut n_input = 0;
    for source in &config.input {
        let set = SequenceSet::from_fasta(source.fasta(), SetKind::Input)
            .with_context(|| format!("Failed to read input sequences: {}", source.fasta().display()))?;
        n_input += set.len();
    }

    let ctx = RunContext::new(config.seed)?;
    let background = prepare_background(&config, n_input, &ctx)?;
    let cutoffs = calibrate(&config, &motifs, background.as_ref(), &ctx)?;

    write_cutoffs(&cutoffs, &output)?;
    info!(
        "Wrote {} cutoffs to {} ({} warnings)",
        cutoffs.len(),
        output.display(),
        ctx.warnings().len()
    );

    Ok(())
}
