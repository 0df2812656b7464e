use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::{info, warn};

use motifcal_threshold::{PipelineConfig, RunContext, run};

use crate::options::apply_overrides;

pub fn run_pipeline(matches: &ArgMatches) -> Result<()> {
    let config_path = matches
        .get_one::<PathBuf>("config")
        .context("A config file is required.")?;

    let mut config = PipelineConfig::from_path(config_path)?;
    apply_overrides(&mut config, matches)?;

    if matches.get_flag("print-config") {
        print!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    let ctx = RunContext::new(config.seed)?;
    info!("Run seed: {}", ctx.seed());
    let output = run(&config, &ctx)?;

    if !output.warnings.is_empty() {
        warn!(
            "{} warnings, see {}",
            output.warnings.len(),
            config.outdir.join(motifcal_threshold::consts::SUMMARY_FILE).display()
        );
    }
    for file in &output.files {
        info!("Wrote {}", file.display());
    }

    Ok(())
}
