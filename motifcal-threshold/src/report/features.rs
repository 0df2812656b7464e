use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use anyhow::Result;

use motifcal_core::models::{ClassifiedHit, GenomicCoordinates};

use crate::calibrator::CutoffTable;
use crate::classifier::SetClassification;
use crate::consts::{GFF_FEATURE_TYPE, GFF_SOURCE};
use crate::report::write_atomic;

/// Coordinates of a hit, falling back to its in-sequence offsets if it was
/// never projected.
fn placement(hit: &ClassifiedHit) -> GenomicCoordinates {
    hit.coordinates.clone().unwrap_or_else(|| GenomicCoordinates {
        chrom: hit.sequence_id().to_string(),
        start: hit.record.start,
        end: hit.record.end,
        precise: false,
    })
}

fn feature_name(hit: &ClassifiedHit) -> String {
    format!("{}_{}_{}", hit.motif_id(), hit.sequence_id(), hit.rank)
}

pub fn render_gff<W: Write + ?Sized>(classification: &SetClassification, w: &mut W) -> std::io::Result<()> {
    writeln!(w, "##gff-version 3")?;
    for hit in &classification.hits {
        let coords = placement(hit);
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t.\tID={};motif={};rank={}",
            coords.chrom,
            GFF_SOURCE,
            GFF_FEATURE_TYPE,
            coords.start + 1,
            coords.end,
            hit.score(),
            hit.record.strand,
            feature_name(hit),
            hit.motif_id(),
            hit.rank,
        )?;
    }
    Ok(())
}

///
/// Write the retained hits of one set as GFF3 features. Coordinates are
/// 1-based and inclusive.
///
pub fn write_gff(classification: &SetClassification, path: &Path) -> Result<()> {
    write_atomic(path, |w| render_gff(classification, w))
}

/// Map a score onto the 0-1000 BED score range between the cutoff and the
/// best score of that motif.
fn bed_score(score: f64, floor: f64, ceiling: f64) -> u32 {
    if ceiling - floor <= f64::EPSILON {
        return 1000;
    }
    let scaled = ((score - floor) / (ceiling - floor)).clamp(0.0, 1.0);
    (scaled * 1000.0).round() as u32
}

fn item_rgb(bed_score: u32) -> String {
    let shade = 200 - (bed_score * 200 / 1000);
    format!("{shade},{shade},{shade}")
}

pub fn render_bed<W: Write + ?Sized>(
    classification: &SetClassification,
    cutoffs: &CutoffTable,
    w: &mut W,
) -> std::io::Result<()> {
    let mut best: HashMap<&str, f64> = HashMap::new();
    for hit in &classification.hits {
        let entry = best.entry(hit.motif_id()).or_insert(f64::MIN);
        *entry = entry.max(hit.score());
    }

    writeln!(
        w,
        "track name=\"{0}\" description=\"motif hits in {0}\" itemRgb=\"On\"",
        classification.set_id
    )?;

    for hit in classification.hits.iter().filter(|h| !placement(h).precise) {
        writeln!(
            w,
            "# {} placed relative to sequence {}",
            feature_name(hit),
            hit.sequence_id()
        )?;
    }

    for hit in &classification.hits {
        let coords = placement(hit);
        let ceiling = best.get(hit.motif_id()).copied().unwrap_or(hit.score());
        let floor = cutoffs
            .get(hit.motif_id())
            .map_or(hit.score(), |c| c.score.min(ceiling));
        let score = bed_score(hit.score(), floor, ceiling);
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            coords.chrom,
            coords.start,
            coords.end,
            hit.motif_id(),
            score,
            hit.record.strand,
            coords.start,
            coords.end,
            item_rgb(score),
        )?;
    }
    Ok(())
}

///
/// Write the retained hits of one set as a BED9 track, shaded by score.
/// Hits without genome coordinates are listed in comments at the top.
///
pub fn write_bed(classification: &SetClassification, cutoffs: &CutoffTable, path: &Path) -> Result<()> {
    write_atomic(path, |w| render_bed(classification, cutoffs, w))
}
