use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;

use motifcal_core::models::{SequenceSet, SetKind};
use motifcal_threshold::consts::{BACKGROUND_SAMPLE_FILE, DEFAULT_LENGTH, DEFAULT_TIMES};
use motifcal_threshold::report::write_atomic;
use motifcal_threshold::{BackgroundSampler, RunContext};

pub fn run_sample(matches: &ArgMatches) -> Result<()> {
    let pool_path = matches
        .get_one::<PathBuf>("pool")
        .context("A background pool FASTA is required.")?;
    let inputs: Vec<&PathBuf> = matches
        .get_many::<PathBuf>("input")
        .context("At least one input FASTA is required.")?
        .collect();
    let times = matches.get_one::<usize>("times").copied().unwrap_or(DEFAULT_TIMES);
    let length = matches.get_one::<usize>("length").copied().unwrap_or(DEFAULT_LENGTH);
    let seed = matches.get_one::<u64>("seed").copied();
    let replace = !matches.get_flag("no-replace");
    let output = matches
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(BACKGROUND_SAMPLE_FILE));

    let mut n_input = 0;
    for path in &inputs {
        let set = SequenceSet::from_fasta(path, SetKind::Input)
            .with_context(|| format!("Failed to read input sequences: {}", path.display()))?;
        n_input += set.len();
    }

    let pool = SequenceSet::from_fasta(pool_path, SetKind::Background)
        .with_context(|| format!("Failed to read background pool: {}", pool_path.display()))?;

    let ctx = RunContext::new(seed)?;
    let sampler = BackgroundSampler::new(times, length, replace)?;
    let sample = sampler.sample(&pool, n_input, &ctx)?;

    write_atomic(&output, |w| sample.set.write_fasta_to(w))?;
    info!(
        "Wrote {} background sequences to {} (seed {})",
        sample.set.len(),
        output.display(),
        sample.seed
    );
    // seed goes to stdout so scripts can capture it
    println!("{}", sample.seed);

    Ok(())
}
