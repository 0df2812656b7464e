use std::io::{BufRead, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Serialize;

use motifcal_core::models::{Cutoff, CutoffStatus};
use motifcal_core::utils::get_dynamic_reader;

use crate::calibrator::CutoffTable;
use crate::counts::HitCountMatrix;
use crate::report::write_atomic;

const CUTOFF_HEADER: &str = "motif\tcutoff\ttarget_fpr\tachieved_fpr\tbackground_sequences\tstatus";

pub fn render_stats<W: Write + ?Sized>(matrix: &HitCountMatrix, w: &mut W) -> std::io::Result<()> {
    write!(w, "motif")?;
    for set in &matrix.sets {
        write!(w, "\t{}", set)?;
    }
    writeln!(w)?;
    for (row, motif) in matrix.motifs.iter().enumerate() {
        write!(w, "{}", motif)?;
        for count in matrix.counts.row(row) {
            write!(w, "\t{}", count)?;
        }
        writeln!(w)?;
    }
    Ok(())
}

pub fn write_stats(matrix: &HitCountMatrix, path: &Path) -> Result<()> {
    write_atomic(path, |w| render_stats(matrix, w))
}

pub fn render_cutoffs<W: Write + ?Sized>(cutoffs: &CutoffTable, w: &mut W) -> std::io::Result<()> {
    writeln!(w, "{}", CUTOFF_HEADER)?;
    for cutoff in cutoffs.values() {
        let achieved = cutoff
            .achieved_fpr
            .map_or("NA".to_string(), |f| format!("{:.6}", f));
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}",
            cutoff.motif_id,
            cutoff.score,
            cutoff.target_fpr,
            achieved,
            cutoff.background_sequences,
            cutoff.status
        )?;
    }
    Ok(())
}

pub fn write_cutoffs(cutoffs: &CutoffTable, path: &Path) -> Result<()> {
    write_atomic(path, |w| render_cutoffs(cutoffs, w))
}

///
/// Read a cutoffs table written by [write_cutoffs], so classification can
/// run separately from calibration.
///
pub fn read_cutoffs(path: &Path) -> Result<CutoffTable> {
    let reader = get_dynamic_reader(path)?;
    parse_cutoffs(reader).with_context(|| format!("Invalid cutoffs table: {}", path.display()))
}

pub fn parse_cutoffs<R: BufRead>(reader: R) -> Result<CutoffTable> {
    let mut table = CutoffTable::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with("motif\t") || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 6 {
            anyhow::bail!("line {}: expected 6 columns, found {}", line_num + 1, fields.len());
        }
        let number = |idx: usize| {
            fields[idx]
                .parse::<f64>()
                .with_context(|| format!("line {}: invalid number '{}'", line_num + 1, fields[idx]))
        };
        let cutoff = Cutoff {
            motif_id: fields[0].to_string(),
            score: number(1)?,
            target_fpr: number(2)?,
            achieved_fpr: match fields[3] {
                "NA" => None,
                _ => Some(number(3)?),
            },
            background_sequences: fields[4]
                .parse::<usize>()
                .with_context(|| format!("line {}: invalid count '{}'", line_num + 1, fields[4]))?,
            status: CutoffStatus::from_str(fields[5]).map_err(anyhow::Error::msg)?,
        };
        table.insert(cutoff.motif_id.clone(), cutoff);
    }
    Ok(table)
}

///
/// Machine-readable record of a run.
///
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    pub range: Option<String>,
    pub cutoffs: Vec<Cutoff>,
    pub hits: Option<HitCountMatrix>,
    pub warnings: Vec<String>,
}

pub fn write_summary(summary: &RunSummary, path: &Path) -> Result<()> {
    write_atomic(path, |w| {
        serde_json::to_writer_pretty(&mut *w, summary)?;
        writeln!(w)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Cursor;

    #[fixture]
    fn cutoffs() -> CutoffTable {
        let mut table = CutoffTable::new();
        for (motif, score, achieved, status) in [
            ("CTCF", 12.5, Some(0.04), CutoffStatus::Ok),
            ("GATA1", 20.0, Some(0.2), CutoffStatus::NotAchieved),
            ("SOX2", 5.0, None, CutoffStatus::JustScan),
        ] {
            table.insert(
                motif.to_string(),
                Cutoff {
                    motif_id: motif.to_string(),
                    score,
                    target_fpr: 0.05,
                    achieved_fpr: achieved,
                    background_sequences: 800,
                    status,
                },
            );
        }
        table
    }

    #[rstest]
    fn test_cutoffs_table_reads_back(cutoffs: CutoffTable) {
        let mut out = Vec::new();
        render_cutoffs(&cutoffs, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(CUTOFF_HEADER));
        assert!(text.contains("SOX2\t5\t0.05\tNA\t800\tjustscan"));

        let parsed = parse_cutoffs(Cursor::new(text)).unwrap();
        assert_eq!(parsed, cutoffs);
    }

    #[rstest]
    fn test_parse_cutoffs_rejects_short_rows() {
        assert!(parse_cutoffs(Cursor::new("CTCF\t12.5\n")).is_err());
    }

    #[rstest]
    fn test_render_stats() {
        let mut matrix = HitCountMatrix::new(
            vec!["CTCF".to_string(), "GATA1".to_string()],
            vec!["peaks".to_string(), "control".to_string()],
        );
        matrix.set_count("CTCF", "peaks", 12).unwrap();
        matrix.set_count("GATA1", "control", 3).unwrap();
        let mut out = Vec::new();
        render_stats(&matrix, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "motif\tpeaks\tcontrol\nCTCF\t12\t0\nGATA1\t0\t3\n"
        );
    }
}
