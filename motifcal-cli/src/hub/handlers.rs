use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;

use motifcal_threshold::report::{HubDescriptor, HubTrack, write_hub};

pub fn run_hub(matches: &ArgMatches) -> Result<()> {
    let dir = matches
        .get_one::<PathBuf>("dir")
        .context("An output directory is required.")?;
    let genome = matches
        .get_one::<String>("genome")
        .context("A genome assembly is required.")?;
    let email = matches
        .get_one::<String>("email")
        .context("A contact email is required.")?;
    let name = match matches.get_one::<String>("name") {
        Some(name) => name.clone(),
        None => dir
            .canonicalize()
            .ok()
            .and_then(|d| d.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "motifcal".to_string()),
    };

    let mut sets: Vec<String> = fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "bed"))
        .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();
    sets.sort();

    if sets.is_empty() {
        anyhow::bail!("No .bed files found in {}", dir.display());
    }

    let hub = HubDescriptor {
        name,
        genome: genome.clone(),
        email: email.clone(),
        tracks: sets.iter().map(|set| HubTrack::for_set(set)).collect(),
    };
    let written = write_hub(dir, &hub)?;
    info!(
        "Hub with {} tracks written ({} files); convert each BED to <set>.bb with bedToBigBed",
        hub.tracks.len(),
        written.len()
    );

    Ok(())
}
