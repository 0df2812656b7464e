//! Orchestration of a calibration run: load inputs, prepare the background sample, calibrate
//! cutoffs, classify and project input matches, then write the requested reports.
//!
//! Every stage is exposed on its own so the CLI can run them separately
//! (`sample`, `calibrate`, `annotate`) or chained (`run`).
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use rayon::prelude::*;

use motifcal_core::errors::MotifCalError;
use motifcal_core::models::{CenterTable, MatchRecord, MotifSet, ScanRange, SequenceSet, SetKind};
use motifcal_core::utils::file_stem_id;
use motifcal_core::PipelineWarning;

use crate::adapters::{group_by_motif, read_match_file, MatchSource, ScannerAdapter};
use crate::calibrator::{CutoffTable, ThresholdCalibrator};
use crate::classifier::{hit_matrix, MatchClassifier, SetClassification};
use crate::config::{OutputKind, PipelineConfig};
use crate::consts::{BACKGROUND_SAMPLE_FILE, CUTOFFS_FILE, STATS_FILE, SUMMARY_FILE};
use crate::context::RunContext;
use crate::counts::HitCountMatrix;
use crate::projector::CoordinateProjector;
use crate::report::{write_atomic, write_bed, write_cutoffs, write_gff, write_stats, write_summary, RunSummary};
use crate::sampler::{check_sample_size, BackgroundSampler};

/// An input sequence set together with the scanner output produced on it.
#[derive(Debug, Clone)]
pub struct InputSet {
    pub set: SequenceSet,
    pub matches: Vec<PathBuf>,
}

/// Background sequences the cutoffs are calibrated against.
#[derive(Debug, Clone)]
pub struct PreparedBackground {
    pub set: SequenceSet,
    /// Where the sample was written, when it was drawn during this run.
    pub written_to: Option<PathBuf>,
}

/// Everything a full run produced, including the paths it wrote.
#[derive(Debug)]
pub struct PipelineOutput {
    pub seed: u64,
    pub cutoffs: CutoffTable,
    pub classifications: Vec<SetClassification>,
    pub hits: HitCountMatrix,
    pub warnings: Vec<PipelineWarning>,
    pub files: Vec<PathBuf>,
}

pub fn load_motifs(path: &Path) -> Result<MotifSet> {
    let motifs = MotifSet::try_from(path)?;
    info!("Loaded {} motifs from {}", motifs.len(), path.display());
    Ok(motifs)
}

///
/// Read every input FASTA of the config and attach peak centers when a
/// center table is configured. Set ids must be unique.
///
pub fn load_inputs(config: &PipelineConfig) -> Result<Vec<InputSet>> {
    let centers = match &config.center {
        Some(path) => Some(CenterTable::from_path(path, config.center_columns()?)?),
        None => None,
    };

    let mut seen = HashSet::new();
    let mut inputs = Vec::with_capacity(config.input.len());
    for source in &config.input {
        let mut set = SequenceSet::from_fasta(source.fasta(), SetKind::Input)
            .with_context(|| format!("Failed to read input sequences: {}", source.fasta().display()))?;
        if let Some(id) = source.id() {
            set.id = id.to_string();
        }
        if !seen.insert(set.id.clone()) {
            return Err(MotifCalError::Configuration(format!(
                "duplicate input set id '{}'",
                set.id
            ))
            .into());
        }
        if let Some(table) = &centers {
            let annotated = set.attach_centers(table);
            info!("{}: {} of {} sequences have peak centers", set.id, annotated, set.len());
        }
        inputs.push(InputSet {
            set,
            matches: source.matches().to_vec(),
        });
    }
    Ok(inputs)
}

pub fn input_sequence_count(inputs: &[InputSet]) -> usize {
    inputs.iter().map(|i| i.set.len()).sum()
}

///
/// Resolve the background sample. A pre-drawn sample is checked against the
/// required size; otherwise one is drawn from the pool with the run seed and
/// written to `outdir` so it can be scanned.
///
pub fn prepare_background(
    config: &PipelineConfig,
    n_input: usize,
    ctx: &RunContext,
) -> Result<Option<PreparedBackground>> {
    if let Some(path) = &config.background_sample {
        let set = SequenceSet::from_fasta(path, SetKind::Background)
            .with_context(|| format!("Failed to read background sample: {}", path.display()))?;
        match check_sample_size(&set, n_input, config.times, config.length) {
            Ok(()) => {}
            Err(MotifCalError::InsufficientBackground { .. }) if config.justscan => {
                info!("Background sample too small, ignored in just-scan mode");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }
        return Ok(Some(PreparedBackground {
            set,
            written_to: None,
        }));
    }

    let Some(pool_path) = &config.background else {
        // only reachable in just-scan mode, validate() rejects it otherwise
        return Ok(None);
    };

    let pool = SequenceSet::from_fasta(pool_path, SetKind::Background)
        .with_context(|| format!("Failed to read background pool: {}", pool_path.display()))?;
    let sampler = BackgroundSampler::new(config.times, config.length, config.replace)?;
    let sample = match sampler.sample(&pool, n_input, ctx) {
        Ok(sample) => sample,
        Err(MotifCalError::InsufficientBackground { .. }) if config.justscan => {
            info!("Background pool too small, ignored in just-scan mode");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    // staged in the run workdir, which goes away with the context on every exit
    // path; only a complete sample is published to outdir
    let staged = ctx.temp_path(BACKGROUND_SAMPLE_FILE);
    sample.set.write_fasta(&staged)?;
    let target = config.outdir.join(BACKGROUND_SAMPLE_FILE);
    write_atomic(&target, |w| {
        let mut file = File::open(&staged)?;
        io::copy(&mut file, w).map(|_| ())
    })?;
    info!(
        "Background sample of {} sequences (seed {}) written to {}",
        sample.set.len(),
        sample.seed,
        target.display()
    );

    Ok(Some(PreparedBackground {
        set: sample.set,
        written_to: Some(target),
    }))
}

/// Scanner output read for one sequence set.
#[derive(Debug, Default)]
pub struct MatchBatch {
    pub records: Vec<MatchRecord>,
    pub warnings: Vec<PipelineWarning>,
    /// Motifs with at least one match file that could not be parsed. Their
    /// matches are incomplete and must not be calibrated or counted.
    pub failed: BTreeSet<String>,
}

impl MatchBatch {
    /// Records grouped by motif, without the motifs in `failed`.
    pub fn usable_by_motif(self) -> BTreeMap<String, Vec<MatchRecord>> {
        let mut grouped = group_by_motif(self.records);
        grouped.retain(|motif, _| !self.failed.contains(motif));
        grouped
    }
}

///
/// Read scanner output files. A file that fails to parse is skipped and
/// reported as a warning; the motifs it covers are marked as failed (all of
/// them for a multi-motif file). I/O failures abort.
///
pub fn read_matches(
    adapter: &dyn ScannerAdapter,
    paths: &[PathBuf],
    set_id: &str,
    kind: SetKind,
    motifs: &MotifSet,
    range: &ScanRange,
) -> Result<MatchBatch, MotifCalError> {
    let mut batch = MatchBatch::default();

    for path in paths {
        let stem = file_stem_id(path);
        let mut source = MatchSource::new(set_id, kind);
        // one-motif-per-file scanners name their output after the motif
        if motifs.get(&stem).is_some() {
            source = source.with_motif(stem);
        }

        match read_match_file(adapter, path, &source, Some(range)) {
            Ok(mut parsed) => {
                info!("{}: {} matches from {}", set_id, parsed.len(), path.display());
                batch.records.append(&mut parsed);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                match &source.motif_hint {
                    Some(motif) => {
                        batch.failed.insert(motif.clone());
                    }
                    None => batch.failed.extend(motifs.ids().into_iter().map(String::from)),
                }
                batch.warnings.push(PipelineWarning::ScannerAdapter {
                    motif: source.motif_hint.clone().unwrap_or_else(|| "*".to_string()),
                    set: set_id.to_string(),
                    reason: format!("{}: {}", path.display(), e),
                });
            }
        }
    }

    Ok(batch)
}

///
/// Calibrate one cutoff per motif. In just-scan mode the background is not
/// read at all.
///
pub fn calibrate(
    config: &PipelineConfig,
    motifs: &MotifSet,
    background: Option<&PreparedBackground>,
    ctx: &RunContext,
) -> Result<CutoffTable> {
    let range = config.scan_range()?;
    let calibrator = ThresholdCalibrator::new(range, config.fpr, config.justscan)?;
    let ids = motifs.ids();

    if config.justscan {
        let n_background = background.map_or(0, |b| b.set.len());
        return Ok(calibrator.calibrate_all(&ids, &BTreeMap::new(), n_background, ctx)?);
    }

    let background = background.ok_or_else(|| {
        MotifCalError::configuration("a background sample is required unless justscan is set")
    })?;
    if config.background_matches.is_empty() {
        let hint = background
            .written_to
            .as_ref()
            .map(|p| format!(": scan {} and pass the output as background_matches", p.display()))
            .unwrap_or_default();
        return Err(MotifCalError::Configuration(format!(
            "background matches are required for calibration{}",
            hint
        ))
        .into());
    }

    let adapter = config.scanner_kind()?.adapter();
    let mut batch = read_matches(
        adapter.as_ref(),
        &config.background_matches,
        &background.set.id,
        SetKind::Background,
        motifs,
        &range,
    )?;
    ctx.warn_all(std::mem::take(&mut batch.warnings));

    let known: HashSet<&str> = background.set.records.iter().map(|r| r.id.as_str()).collect();
    let unknown: HashSet<&str> = batch
        .records
        .iter()
        .map(|r| r.sequence_id.as_str())
        .filter(|id| !known.contains(id))
        .collect();
    if !unknown.is_empty() {
        return Err(MotifCalError::Configuration(format!(
            "background matches reference {} sequences absent from the background sample (scanned a different sample or seed?)",
            unknown.len()
        ))
        .into());
    }

    // incomplete background would understate the FPR; such motifs get no cutoff
    let calibrated: Vec<&str> = ids
        .into_iter()
        .filter(|id| !batch.failed.contains(*id))
        .collect();
    if !batch.failed.is_empty() {
        warn!(
            "{} motifs left without a cutoff after unreadable background matches",
            batch.failed.len()
        );
    }
    let grouped = batch.usable_by_motif();
    Ok(calibrator.calibrate_all(&calibrated, &grouped, background.set.len(), ctx)?)
}

///
/// Classify and project the matches of every input set in parallel.
/// Results keep the input order.
///
pub fn classify(
    config: &PipelineConfig,
    motifs: &MotifSet,
    inputs: &[InputSet],
    cutoffs: &CutoffTable,
    ctx: &RunContext,
) -> Result<Vec<SetClassification>> {
    let range = config.scan_range()?;
    let adapter = config.scanner_kind()?.adapter();
    let classifier = MatchClassifier::new(config.besthit, config.uniquestats)?;
    let projector = CoordinateProjector::new(config.strand_frame());

    let results = inputs
        .par_iter()
        .map(|input| -> Result<(SetClassification, Vec<PipelineWarning>), MotifCalError> {
            let mut batch = read_matches(
                adapter.as_ref(),
                &input.matches,
                &input.set.id,
                SetKind::Input,
                motifs,
                &range,
            )?;
            let mut warnings = std::mem::take(&mut batch.warnings);
            let grouped = batch.usable_by_motif();
            let (mut classification, classify_warnings) =
                classifier.classify_set(&input.set.id, &grouped, cutoffs);
            warnings.extend(classify_warnings);
            warnings.extend(projector.project_all(&mut classification.hits, &input.set));
            info!(
                "{}: {} hits retained across {} motifs",
                input.set.id,
                classification.hits.len(),
                classification.stats.len()
            );
            Ok((classification, warnings))
        })
        .collect::<Result<Vec<_>, MotifCalError>>()?;

    let mut classifications = Vec::with_capacity(results.len());
    for (classification, warnings) in results {
        ctx.warn_all(warnings);
        classifications.push(classification);
    }
    Ok(classifications)
}

///
/// Write the configured reports plus `cutoffs.tsv` and `summary.json` into
/// `outdir`. Returns the written paths.
///
pub fn emit_reports(
    config: &PipelineConfig,
    cutoffs: &CutoffTable,
    classifications: &[SetClassification],
    hits: &HitCountMatrix,
    ctx: &RunContext,
) -> Result<Vec<PathBuf>> {
    let outdir = &config.outdir;
    let mut files = Vec::new();

    let cutoffs_path = outdir.join(CUTOFFS_FILE);
    write_cutoffs(cutoffs, &cutoffs_path)?;
    files.push(cutoffs_path);

    if config.wants(OutputKind::Stats) {
        let path = outdir.join(STATS_FILE);
        write_stats(hits, &path)?;
        files.push(path);
    }

    for classification in classifications {
        if config.wants(OutputKind::Gff) {
            let path = outdir.join(format!("{}.gff", classification.set_id));
            write_gff(classification, &path)?;
            files.push(path);
        }
        if config.wants(OutputKind::Bed) {
            let path = outdir.join(format!("{}.bed", classification.set_id));
            write_bed(classification, cutoffs, &path)?;
            files.push(path);
        }
    }

    let summary = RunSummary {
        seed: ctx.seed(),
        range: config.range.clone(),
        cutoffs: cutoffs.values().cloned().collect(),
        hits: Some(hits.clone()),
        warnings: ctx.warnings().iter().map(|w| w.to_string()).collect(),
    };
    let summary_path = outdir.join(SUMMARY_FILE);
    write_summary(&summary, &summary_path)?;
    files.push(summary_path);

    Ok(files)
}

///
/// Run the whole pipeline for a validated config.
///
pub fn run(config: &PipelineConfig, ctx: &RunContext) -> Result<PipelineOutput> {
    config.validate()?;

    let motif_path = config
        .motif
        .as_deref()
        .ok_or_else(|| MotifCalError::configuration("a motif file is required"))?;
    let motifs = load_motifs(motif_path)?;
    let inputs = load_inputs(config)?;
    let n_input = input_sequence_count(&inputs);
    info!("{} input sets, {} sequences", inputs.len(), n_input);

    let background = prepare_background(config, n_input, ctx)?;
    let cutoffs = calibrate(config, &motifs, background.as_ref(), ctx)?;
    let classifications = classify(config, &motifs, &inputs, &cutoffs, ctx)?;
    let hits = hit_matrix(&motifs.ids(), &classifications)?;
    let files = emit_reports(config, &cutoffs, &classifications, &hits, ctx)?;

    let warnings = ctx.warnings();
    info!(
        "Run finished: {} files written, {} warnings",
        files.len(),
        warnings.len()
    );

    Ok(PipelineOutput {
        seed: ctx.seed(),
        cutoffs,
        classifications,
        hits,
        warnings,
        files,
    })
}
