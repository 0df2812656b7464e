use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;

use motifcal_threshold::report::read_cutoffs;
use motifcal_threshold::{
    PipelineConfig, RunContext, classify, emit_reports, hit_matrix, load_inputs, load_motifs,
};

use crate::options::apply_overrides;

pub fn run_annotate(matches: &ArgMatches) -> Result<()> {
    let mut config = PipelineConfig::default();
    apply_overrides(&mut config, matches)?;
    let cutoffs_path = matches
        .get_one::<PathBuf>("cutoffs")
        .context("A cutoffs table is required.")?;

    let motif_path = config.motif.clone().context("A motif file is required.")?;
    let motifs = load_motifs(&motif_path)?;
    let cutoffs = read_cutoffs(cutoffs_path)?;
    let inputs = load_inputs(&config)?;

    let ctx = RunContext::new(config.seed)?;
    let classifications = classify(&config, &motifs, &inputs, &cutoffs, &ctx)?;
    let hits = hit_matrix(&motifs.ids(), &classifications)?;
    let files = emit_reports(&config, &cutoffs, &classifications, &hits, &ctx)?;

    for file in &files {
        info!("Wrote {}", file.display());
    }

    Ok(())
}
