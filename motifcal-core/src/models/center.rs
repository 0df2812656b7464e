use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use anyhow::Result;

use crate::errors::MotifCalError;
use crate::utils::{get_dynamic_reader, parse_genomic_id};

/// Default 1-based columns of the center table: peak id, summit, extension.
pub const DEFAULT_CENTER_COLUMNS: [usize; 3] = [1, 2, 3];

///
/// Summit and extension of the peak a sequence was cut from. The sequence
/// spans `[summit - extension, summit + extension)` on `chrom`.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeakCenter {
    pub chrom: Option<String>,
    pub summit: u64,
    pub extension: u64,
}

impl PeakCenter {
    pub fn new(chrom: Option<String>, summit: u64, extension: u64) -> Self {
        Self {
            chrom,
            summit,
            extension,
        }
    }

    /// Genome position of the first base of the extracted sequence. `None`
    /// when the extension runs past the chromosome start.
    pub fn sequence_origin(&self) -> Option<u64> {
        self.summit.checked_sub(self.extension)
    }

    /// The extended peak interval, clamped at the chromosome start.
    pub fn extended(&self) -> (u64, u64) {
        (
            self.summit.saturating_sub(self.extension),
            self.summit + self.extension,
        )
    }
}

///
/// Peak summit metadata keyed by peak (sequence) id.
///
#[derive(Debug, Clone, Default)]
pub struct CenterTable {
    entries: HashMap<String, PeakCenter>,
}

impl CenterTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&PeakCenter> {
        self.entries.get(id)
    }

    pub fn insert(&mut self, id: impl Into<String>, center: PeakCenter) {
        self.entries.insert(id.into(), center);
    }

    ///
    /// Load a center table from disk.
    ///
    /// # Arguments
    /// - path: tab-delimited file, `#` lines are ignored
    /// - columns: 1-based indices of the id, summit and extension columns
    ///
    pub fn from_path(path: &Path, columns: [usize; 3]) -> Result<Self> {
        let reader = get_dynamic_reader(path)?;
        Ok(Self::read(reader, columns)?)
    }

    pub fn read<R: BufRead>(reader: R, columns: [usize; 3]) -> Result<Self, MotifCalError> {
        if columns.contains(&0) {
            return Err(MotifCalError::Configuration(format!(
                "center columns are 1-based, got {:?}",
                columns
            )));
        }
        let [id_col, summit_col, ext_col] = columns.map(|c| c - 1);
        let mut table = CenterTable::default();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            let field = |idx: usize, name: &str| {
                fields.get(idx).copied().ok_or_else(|| {
                    MotifCalError::CenterParse(format!(
                        "line {}: missing {} column {}",
                        line_num + 1,
                        name,
                        idx + 1
                    ))
                })
            };

            let id = field(id_col, "id")?;
            let summit_field = field(summit_col, "summit")?;
            let ext_field = field(ext_col, "extension")?;

            let (chrom, summit) = match summit_field.rsplit_once(':') {
                Some((chrom, pos)) => (Some(chrom.to_string()), pos),
                None => (parse_genomic_id(id).map(|(chrom, _, _)| chrom), summit_field),
            };

            // header line
            if line_num == 0 && summit.parse::<u64>().is_err() {
                continue;
            }

            let summit = summit.parse::<u64>().map_err(|_| {
                MotifCalError::CenterParse(format!(
                    "line {}: invalid summit '{}'",
                    line_num + 1,
                    summit_field
                ))
            })?;
            let extension = ext_field.parse::<u64>().map_err(|_| {
                MotifCalError::CenterParse(format!(
                    "line {}: invalid extension '{}'",
                    line_num + 1,
                    ext_field
                ))
            })?;

            table.insert(id, PeakCenter::new(chrom, summit, extension));
        }

        Ok(table)
    }

    ///
    /// Extend a peak around its summit; returns `(chrom, start, end)`.
    ///
    pub fn extend_peak(&self, id: &str) -> Option<(Option<&str>, u64, u64)> {
        self.entries.get(id).map(|center| {
            let (start, end) = center.extended();
            (center.chrom.as_deref(), start, end)
        })
    }
}
