use std::fmt::{self, Display};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use motifcal_core::errors::MotifCalError;
use motifcal_core::models::{DEFAULT_CENTER_COLUMNS, ScanRange};

use crate::adapters::ScannerKind;
use crate::consts::{DEFAULT_BESTHIT, DEFAULT_FPR, DEFAULT_LENGTH, DEFAULT_TIMES};
use crate::projector::StrandFrame;

/// Per-set reports a run can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Stats,
    Gff,
    Bed,
}

impl FromStr for OutputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stats" => Ok(OutputKind::Stats),
            "gff" => Ok(OutputKind::Gff),
            "bed" => Ok(OutputKind::Bed),
            _ => Err(format!("Unknown output type: {}", s)),
        }
    }
}

impl Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputKind::Stats => write!(f, "stats"),
            OutputKind::Gff => write!(f, "gff"),
            OutputKind::Bed => write!(f, "bed"),
        }
    }
}

///
/// One input sequence set: a FASTA file plus the scanner output produced on
/// it. Written either as a bare FASTA path or as a mapping.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputSource {
    Path(PathBuf),
    Detailed {
        fasta: PathBuf,
        #[serde(default)]
        matches: Vec<PathBuf>,
        #[serde(default)]
        id: Option<String>,
    },
}

impl InputSource {
    pub fn fasta(&self) -> &Path {
        match self {
            InputSource::Path(path) => path,
            InputSource::Detailed { fasta, .. } => fasta,
        }
    }

    pub fn matches(&self) -> &[PathBuf] {
        match self {
            InputSource::Path(_) => &[],
            InputSource::Detailed { matches, .. } => matches,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            InputSource::Path(_) => None,
            InputSource::Detailed { id, .. } => id.as_deref(),
        }
    }
}

fn default_fpr() -> f64 {
    DEFAULT_FPR
}

fn default_times() -> usize {
    DEFAULT_TIMES
}

fn default_length() -> usize {
    DEFAULT_LENGTH
}

fn default_besthit() -> usize {
    DEFAULT_BESTHIT
}

fn default_scanner() -> String {
    ScannerKind::Fimo.to_string()
}

fn default_colext() -> Vec<usize> {
    DEFAULT_CENTER_COLUMNS.to_vec()
}

fn default_output() -> Vec<OutputKind> {
    vec![OutputKind::Stats, OutputKind::Gff, OutputKind::Bed]
}

fn default_outdir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

///
/// Every option of a calibration run. Deserialized from YAML, TOML or a
/// tab-delimited parameter file; CLI flags are applied on top.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default)]
    pub input: Vec<InputSource>,
    #[serde(default)]
    pub motif: Option<PathBuf>,
    /// Background pool to sample from.
    #[serde(default)]
    pub background: Option<PathBuf>,
    /// A previously drawn background sample (FASTA) the background matches
    /// were computed on.
    #[serde(default)]
    pub background_sample: Option<PathBuf>,
    #[serde(default)]
    pub background_matches: Vec<PathBuf>,
    #[serde(default = "default_scanner")]
    pub scanner: String,
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default = "default_fpr")]
    pub fpr: f64,
    #[serde(default = "default_times")]
    pub times: usize,
    #[serde(default = "default_length")]
    pub length: usize,
    #[serde(default = "default_besthit")]
    pub besthit: usize,
    #[serde(default)]
    pub uniquestats: bool,
    #[serde(default)]
    pub justscan: bool,
    #[serde(default)]
    pub center: Option<PathBuf>,
    #[serde(default = "default_colext")]
    pub colext: Vec<usize>,
    #[serde(default = "default_output")]
    pub output: Vec<OutputKind>,
    #[serde(default = "default_outdir")]
    pub outdir: PathBuf,
    #[serde(default)]
    pub seed: Option<u64>,
    /// Allow sampling the background with replacement when the pool is small.
    #[serde(default = "default_true")]
    pub replace: bool,
    #[serde(default)]
    pub strand_relative: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: Vec::new(),
            motif: None,
            background: None,
            background_sample: None,
            background_matches: Vec::new(),
            scanner: default_scanner(),
            range: None,
            fpr: DEFAULT_FPR,
            times: DEFAULT_TIMES,
            length: DEFAULT_LENGTH,
            besthit: DEFAULT_BESTHIT,
            uniquestats: false,
            justscan: false,
            center: None,
            colext: default_colext(),
            output: default_output(),
            outdir: default_outdir(),
            seed: None,
            replace: true,
            strand_relative: false,
        }
    }
}

/// Keys whose values are lists in a tab-delimited parameter file.
const LIST_KEYS: [&str; 4] = ["background_matches", "colext", "output", "input"];
/// Keys kept as strings in a tab-delimited parameter file.
const STRING_KEYS: [&str; 2] = ["range", "scanner"];

impl PipelineConfig {
    ///
    /// Load a config file. `.yaml`/`.yml` is read as YAML, `.toml` as TOML,
    /// anything else as a tab-delimited `key<TAB>value...` parameter file.
    ///
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        let mut config: Self = match ext.as_deref() {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid YAML config: {}", path.display()))?,
            Some("toml") => toml::from_str(&content)
                .with_context(|| format!("Invalid TOML config: {}", path.display()))?,
            _ => Self::from_params(&content)
                .with_context(|| format!("Invalid parameter file: {}", path.display()))?,
        };
        if let Some(base) = path.parent() {
            config.resolve_relative(base);
        }
        Ok(config)
    }

    ///
    /// Make every relative path of the config relative to `base`, the
    /// directory of the config file.
    ///
    pub fn resolve_relative(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        for input in self.input.iter_mut() {
            match input {
                InputSource::Path(fasta) => join(fasta),
                InputSource::Detailed { fasta, matches, .. } => {
                    join(fasta);
                    matches.iter_mut().for_each(join);
                }
            }
        }
        self.motif.iter_mut().for_each(join);
        self.background.iter_mut().for_each(join);
        self.background_sample.iter_mut().for_each(join);
        self.background_matches.iter_mut().for_each(join);
        self.center.iter_mut().for_each(join);
        join(&mut self.outdir);
    }

    ///
    /// Parse a tab-delimited parameter file. Each line holds a key followed
    /// by one or more values; `input` lines hold a FASTA path followed by its
    /// match files and may repeat.
    ///
    pub fn from_params(content: &str) -> Result<Self> {
        let mut mapping = Mapping::new();
        let mut inputs: Vec<Value> = Vec::new();

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split('\t').map(str::trim).filter(|f| !f.is_empty());
            let Some(key) = fields.next() else { continue };
            let values: Vec<&str> = fields.collect();
            if values.is_empty() {
                anyhow::bail!("line {}: no value for '{}'", line_num + 1, key);
            }

            if key == "input" {
                let mut entry = Mapping::new();
                entry.insert("fasta".into(), values[0].into());
                entry.insert(
                    "matches".into(),
                    Value::Sequence(values[1..].iter().map(|v| (*v).into()).collect()),
                );
                inputs.push(Value::Mapping(entry));
                continue;
            }

            let scalar = |raw: &str| -> Value {
                if STRING_KEYS.contains(&key) {
                    Value::String(raw.to_string())
                } else {
                    serde_yaml::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
                }
            };

            let value = if LIST_KEYS.contains(&key) {
                Value::Sequence(
                    values
                        .iter()
                        .flat_map(|v| v.split(','))
                        .map(|v| scalar(v.trim()))
                        .collect(),
                )
            } else {
                scalar(values[0])
            };
            mapping.insert(key.into(), value);
        }

        if !inputs.is_empty() {
            mapping.insert("input".into(), Value::Sequence(inputs));
        }

        Ok(serde_yaml::from_value(Value::Mapping(mapping))?)
    }

    pub fn scan_range(&self) -> Result<ScanRange, MotifCalError> {
        let range = self
            .range
            .as_deref()
            .ok_or_else(|| MotifCalError::configuration("a score range (low:high or low:step:high) is required"))?;
        ScanRange::from_str(range)
    }

    pub fn scanner_kind(&self) -> Result<ScannerKind, MotifCalError> {
        ScannerKind::from_str(&self.scanner).map_err(MotifCalError::Configuration)
    }

    pub fn center_columns(&self) -> Result<[usize; 3], MotifCalError> {
        match self.colext.as_slice() {
            [id, summit, ext] if *id > 0 && *summit > 0 && *ext > 0 => Ok([*id, *summit, *ext]),
            _ => Err(MotifCalError::Configuration(format!(
                "colext must be three 1-based column indices, got {:?}",
                self.colext
            ))),
        }
    }

    pub fn strand_frame(&self) -> StrandFrame {
        if self.strand_relative {
            StrandFrame::StrandRelative
        } else {
            StrandFrame::Forward
        }
    }

    pub fn wants(&self, kind: OutputKind) -> bool {
        self.output.contains(&kind)
    }

    ///
    /// Check every option before any work starts.
    ///
    pub fn validate(&self) -> Result<(), MotifCalError> {
        let motif = self
            .motif
            .as_ref()
            .ok_or_else(|| MotifCalError::configuration("a motif file is required"))?;
        require_file(motif, "motif")?;

        if self.input.is_empty() {
            return Err(MotifCalError::configuration(
                "at least one input sequence set is required",
            ));
        }
        for input in &self.input {
            require_file(input.fasta(), "input")?;
            for matches in input.matches() {
                require_file(matches, "input matches")?;
            }
        }

        self.scan_range()?;
        self.scanner_kind()?;
        self.center_columns()?;

        if !(self.fpr > 0.0 && self.fpr <= 1.0) {
            return Err(MotifCalError::Configuration(format!(
                "fpr must be in (0, 1], got {}",
                self.fpr
            )));
        }
        if self.times == 0 {
            return Err(MotifCalError::configuration("times must be at least 1"));
        }
        if self.length == 0 {
            return Err(MotifCalError::configuration("length must be at least 1"));
        }
        if self.besthit == 0 {
            return Err(MotifCalError::configuration("besthit must be at least 1"));
        }

        if !self.justscan && self.background.is_none() && self.background_sample.is_none() {
            return Err(MotifCalError::configuration(
                "a background file is required unless justscan is set",
            ));
        }
        for path in self.background.iter().chain(self.background_sample.iter()) {
            require_file(path, "background")?;
        }
        for path in &self.background_matches {
            require_file(path, "background matches")?;
        }
        if let Some(center) = &self.center {
            require_file(center, "center")?;
        }

        Ok(())
    }
}

fn require_file(path: &Path, what: &str) -> Result<(), MotifCalError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(MotifCalError::Configuration(format!(
            "{} file not found: {}",
            what,
            path.display()
        )))
    }
}
