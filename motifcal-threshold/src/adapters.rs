//! Normalization of scanner output into [MatchRecord]s.
//!
//! Every supported scanning engine gets one [ScannerAdapter] implementation. The rest of the
//! engine only ever sees normalized records: 0-based, half-open, forward-frame offsets.
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::io::{BufRead, ErrorKind};
use std::path::Path;
use std::str::FromStr;

use indicatif::{ProgressBar, ProgressStyle};

use motifcal_core::errors::MotifCalError;
use motifcal_core::models::{MatchRecord, ScanRange, SetKind, Strand};
use motifcal_core::utils::get_dynamic_reader;

///
/// Where a match stream comes from: used to fill in the fields a scanner
/// does not report and to label errors.
///
#[derive(Debug, Clone)]
pub struct MatchSource {
    pub name: String,
    pub kind: SetKind,
    /// Motif id for scanners that run one matrix per output stream.
    pub motif_hint: Option<String>,
}

impl MatchSource {
    pub fn new(name: impl Into<String>, kind: SetKind) -> Self {
        Self {
            name: name.into(),
            kind,
            motif_hint: None,
        }
    }

    pub fn with_motif(mut self, motif: impl Into<String>) -> Self {
        self.motif_hint = Some(motif.into());
        self
    }
}

/// Normalizes one scanner's output format into [MatchRecord]s.
pub trait ScannerAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    ///
    /// Parse one line of scanner output. Returns `Ok(None)` for headers and
    /// comments, `Err(reason)` for malformed lines.
    ///
    fn parse_line(&self, line: &str, source: &MatchSource) -> Result<Option<MatchRecord>, String>;

    ///
    /// Read a whole match stream. Fails on the first malformed line, on a
    /// score outside `range`, and on a stream without any match.
    ///
    fn read_matches(
        &self,
        reader: &mut dyn BufRead,
        source: &MatchSource,
        range: Option<&ScanRange>,
    ) -> Result<Vec<MatchRecord>, MotifCalError> {
        let mut records = Vec::new();
        let mut line = String::new();
        let mut line_num = 0;

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            line_num += 1;
            let trimmed = line.trim_end_matches(['\n', '\r']);
            if trimmed.trim().is_empty() {
                continue;
            }

            let record = self
                .parse_line(trimmed, source)
                .map_err(|reason| MotifCalError::adapter(&source.name, line_num, reason))?;

            if let Some(record) = record {
                if let Some(range) = range {
                    if !range.contains(record.score) {
                        return Err(MotifCalError::adapter(
                            &source.name,
                            line_num,
                            format!("score {} outside scan range {}", record.score, range),
                        ));
                    }
                }
                records.push(record);
            }
        }

        if records.is_empty() {
            return Err(MotifCalError::adapter(
                &source.name,
                line_num,
                format!("empty {} match stream", self.name()),
            ));
        }

        Ok(records)
    }
}

/// Scanners with a known output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerKind {
    Fimo,
    PwmScan,
}

impl ScannerKind {
    pub fn adapter(&self) -> Box<dyn ScannerAdapter> {
        match self {
            ScannerKind::Fimo => Box::new(FimoAdapter),
            ScannerKind::PwmScan => Box::new(PwmScanAdapter),
        }
    }
}

impl FromStr for ScannerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fimo" => Ok(ScannerKind::Fimo),
            "pwmscan" | "pwm_scan" => Ok(ScannerKind::PwmScan),
            _ => Err(format!("Unknown scanner: {}", s)),
        }
    }
}

impl Display for ScannerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScannerKind::Fimo => write!(f, "fimo"),
            ScannerKind::PwmScan => write!(f, "pwmscan"),
        }
    }
}

fn parse_field<T: FromStr>(fields: &[&str], idx: usize, name: &str) -> Result<T, String> {
    let raw = fields
        .get(idx)
        .ok_or_else(|| format!("missing {} column (expected at least {} columns)", name, idx + 1))?;
    raw.trim()
        .parse::<T>()
        .map_err(|_| format!("invalid {}: '{}'", name, raw))
}

///
/// FIMO tab-separated output:
/// `motif_id  motif_alt_id  sequence_name  start  stop  strand  score  p-value  q-value  matched_sequence`
/// with 1-based inclusive coordinates.
///
pub struct FimoAdapter;

impl ScannerAdapter for FimoAdapter {
    fn name(&self) -> &'static str {
        "fimo"
    }

    fn parse_line(&self, line: &str, source: &MatchSource) -> Result<Option<MatchRecord>, String> {
        if line.starts_with('#') || line.starts_with("motif_id") {
            return Ok(None);
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let motif_id: String = parse_field(&fields, 0, "motif_id")?;
        let sequence_id: String = parse_field(&fields, 2, "sequence_name")?;
        let start: u64 = parse_field(&fields, 3, "start")?;
        let stop: u64 = parse_field(&fields, 4, "stop")?;
        let strand: Strand = parse_field(&fields, 5, "strand")?;
        let score: f64 = parse_field(&fields, 6, "score")?;

        if start == 0 || stop < start {
            return Err(format!("invalid 1-based interval {}-{}", start, stop));
        }

        Ok(Some(MatchRecord {
            motif_id,
            sequence_id,
            kind: source.kind,
            start: start - 1,
            end: stop,
            strand,
            score,
        }))
    }
}

///
/// pwm_scan BED-like output: `seq_id  start  end  matched  score  strand [motif_id]`
/// with 0-based half-open coordinates. The motif id comes from the optional
/// seventh column or from the stream's [MatchSource].
///
pub struct PwmScanAdapter;

impl ScannerAdapter for PwmScanAdapter {
    fn name(&self) -> &'static str {
        "pwmscan"
    }

    fn parse_line(&self, line: &str, source: &MatchSource) -> Result<Option<MatchRecord>, String> {
        if line.starts_with('#') || line.starts_with("track") || line.starts_with("browser") {
            return Ok(None);
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let sequence_id: String = parse_field(&fields, 0, "seq_id")?;
        let start: u64 = parse_field(&fields, 1, "start")?;
        let end: u64 = parse_field(&fields, 2, "end")?;
        let score: f64 = parse_field(&fields, 4, "score")?;
        let strand: Strand = parse_field(&fields, 5, "strand")?;

        let motif_id = match fields.get(6).map(|m| m.trim()).filter(|m| !m.is_empty()) {
            Some(motif) => motif.to_string(),
            None => source
                .motif_hint
                .clone()
                .ok_or_else(|| "no motif column and no motif given for stream".to_string())?,
        };

        if end <= start {
            return Err(format!("invalid interval {}-{}", start, end));
        }

        Ok(Some(MatchRecord {
            motif_id,
            sequence_id,
            kind: source.kind,
            start,
            end,
            strand,
            score,
        }))
    }
}

///
/// Read one match file (optionally gzip'd) through `adapter`, with a spinner
/// on stderr for long files.
///
pub fn read_match_file(
    adapter: &dyn ScannerAdapter,
    path: &Path,
    source: &MatchSource,
    range: Option<&ScanRange>,
) -> Result<Vec<MatchRecord>, MotifCalError> {
    // a file that cannot be opened is an I/O failure, not malformed scanner output
    let mut reader = get_dynamic_reader(path).map_err(|e| {
        let kind = e
            .downcast_ref::<std::io::Error>()
            .map_or(ErrorKind::Other, |io| io.kind());
        MotifCalError::Io(std::io::Error::new(kind, format!("{:#}", e)))
    })?;

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed}] {msg}")
    {
        spinner.set_style(style.tick_strings(&["-", "\\", "|", "/"]));
    }
    spinner.set_message(format!("Reading {} matches from {}", adapter.name(), path.display()));

    let records = adapter.read_matches(&mut reader, source, range);

    spinner.finish_and_clear();
    records
}

/// Group records by motif id, keeping stream order within each motif.
pub fn group_by_motif(records: Vec<MatchRecord>) -> BTreeMap<String, Vec<MatchRecord>> {
    let mut grouped: BTreeMap<String, Vec<MatchRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.motif_id.clone()).or_default().push(record);
    }
    grouped
}
