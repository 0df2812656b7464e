use std::fmt::{self, Display};
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;

use crate::errors::MotifCalError;
use crate::models::center::{CenterTable, PeakCenter};
use crate::utils::{file_stem_id, get_dynamic_reader};

const FASTA_LINE_WIDTH: usize = 60;

/// Whether a sequence set carries real data or the null model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SetKind {
    Input,
    Background,
}

impl Display for SetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetKind::Input => write!(f, "input"),
            SetKind::Background => write!(f, "background"),
        }
    }
}

impl FromStr for SetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "input" => Ok(SetKind::Input),
            "background" | "bg" => Ok(SetKind::Background),
            _ => Err(format!("Invalid sequence set kind: {}", s)),
        }
    }
}

///
/// One sequence of a [SequenceSet], with the peak metadata needed to place
/// it back on the genome when known.
///
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceRecord {
    pub id: String,
    pub seq: Vec<u8>,
    pub center: Option<PeakCenter>,
}

impl SequenceRecord {
    pub fn new(id: impl Into<String>, seq: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            seq: seq.into(),
            center: None,
        }
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

///
/// A file-level group of sequences, e.g. one FASTA file of peak regions.
///
#[derive(Debug, Clone)]
pub struct SequenceSet {
    pub id: String,
    pub kind: SetKind,
    pub records: Vec<SequenceRecord>,
    pub path: Option<PathBuf>,
}

impl SequenceSet {
    pub fn new(id: impl Into<String>, kind: SetKind, records: Vec<SequenceRecord>) -> Self {
        Self {
            id: id.into(),
            kind,
            records,
            path: None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SequenceRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    ///
    /// Read a FASTA file (optionally gzip'd) into a [SequenceSet]. The set id
    /// is the file stem.
    ///
    pub fn from_fasta(path: &Path, kind: SetKind) -> Result<Self> {
        let reader = get_dynamic_reader(path)?;
        let mut set = Self::read_fasta(reader, file_stem_id(path), kind)?;
        set.path = Some(path.to_path_buf());
        Ok(set)
    }

    pub fn read_fasta<R: BufRead>(
        reader: R,
        id: impl Into<String>,
        kind: SetKind,
    ) -> Result<Self, MotifCalError> {
        let id = id.into();
        let mut records: Vec<SequenceRecord> = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            if let Some(header) = line.strip_prefix('>') {
                let seq_id = header.split_whitespace().next().unwrap_or("");
                if seq_id.is_empty() {
                    return Err(MotifCalError::SequenceParse(format!(
                        "{}: empty sequence header at line {}",
                        id,
                        line_num + 1
                    )));
                }
                records.push(SequenceRecord::new(seq_id, Vec::new()));
                continue;
            }
            match records.last_mut() {
                Some(record) => record
                    .seq
                    .extend(line.bytes().filter(|b| !b.is_ascii_whitespace())),
                None => {
                    return Err(MotifCalError::SequenceParse(format!(
                        "{}: sequence data before first header at line {}",
                        id,
                        line_num + 1
                    )));
                }
            }
        }

        Ok(SequenceSet::new(id, kind, records))
    }

    pub fn write_fasta(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_fasta_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn write_fasta_to<W: Write + ?Sized>(&self, writer: &mut W) -> std::io::Result<()> {
        for record in &self.records {
            writeln!(writer, ">{}", record.id)?;
            for chunk in record.seq.chunks(FASTA_LINE_WIDTH) {
                writer.write_all(chunk)?;
                writeln!(writer)?;
            }
        }
        Ok(())
    }

    ///
    /// Attach summit/extension metadata to every record whose id appears in
    /// the center table. Returns the number of annotated records.
    ///
    pub fn attach_centers(&mut self, table: &CenterTable) -> usize {
        let mut annotated = 0;
        for record in self.records.iter_mut() {
            if let Some(center) = table.get(&record.id) {
                record.center = Some(center.clone());
                annotated += 1;
            }
        }
        annotated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Cursor;

    #[rstest]
    fn test_read_fasta() {
        let fasta = ">chr1:100-110 peak one\nACGTA\nCGTAC\n\n>peak2\nTTTT\n";
        let set = SequenceSet::read_fasta(Cursor::new(fasta), "peaks", SetKind::Input).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.records[0].id, "chr1:100-110");
        assert_eq!(set.records[0].seq, b"ACGTACGTAC".to_vec());
        assert_eq!(set.get("peak2").unwrap().len(), 4);
    }

    #[rstest]
    #[case("ACGT\n>a\nAC\n")]
    #[case(">\nACGT\n")]
    fn test_read_fasta_rejects(#[case] fasta: &str) {
        let result = SequenceSet::read_fasta(Cursor::new(fasta), "bad", SetKind::Input);
        assert!(matches!(result, Err(MotifCalError::SequenceParse(_))));
    }

    #[rstest]
    fn test_write_fasta_wraps_lines() {
        let record = SequenceRecord::new("long", vec![b'A'; 70]);
        let set = SequenceSet::new("bg", SetKind::Background, vec![record]);
        let mut out = Vec::new();
        set.write_fasta_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].len(), 60);
        assert_eq!(lines[2].len(), 10);
    }

    #[rstest]
    #[case("input", SetKind::Input)]
    #[case("BG", SetKind::Background)]
    fn test_set_kind_from_str(#[case] s: &str, #[case] expected: SetKind) {
        assert_eq!(SetKind::from_str(s).unwrap(), expected);
    }
}
