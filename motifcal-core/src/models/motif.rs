use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::errors::MotifCalError;
use crate::utils::get_dynamic_reader;

pub const BASES: [char; 4] = ['A', 'C', 'G', 'T'];

///
/// A sequence motif represented as a positional weight matrix. Rows are
/// positions, columns are base probabilities in A/C/G/T order.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Motif {
    pub id: String,
    pub matrix: Vec<[f64; 4]>,
}

impl Motif {
    pub fn new(id: impl Into<String>, matrix: Vec<[f64; 4]>) -> Self {
        Self {
            id: id.into(),
            matrix,
        }
    }

    pub fn len(&self) -> usize {
        self.matrix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    /// Consensus sequence, taking the most probable base at each position.
    pub fn consensus(&self) -> String {
        self.matrix
            .iter()
            .map(|row| {
                let mut best = 0;
                for (i, p) in row.iter().enumerate() {
                    if *p > row[best] {
                        best = i;
                    }
                }
                BASES[best]
            })
            .collect()
    }
}

///
/// The motifs loaded from one motif file, in file order.
///
#[derive(Debug, Clone)]
pub struct MotifSet {
    pub motifs: Vec<Motif>,
    pub path: Option<PathBuf>,
}

/// Motif file layouts recognised by [MotifSet::parse].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotifFormat {
    Meme,
    Jaspar,
    Pwm,
}

impl MotifSet {
    pub fn len(&self) -> usize {
        self.motifs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motifs.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.motifs.iter().map(|m| m.id.as_str()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Motif> {
        self.motifs.iter().find(|m| m.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Motif> {
        self.motifs.iter()
    }

    ///
    /// Parse motif file content. The format is detected from the content:
    /// a `MEME version` header selects MEME minimal format, a `>` header
    /// followed by bracketed base rows selects JASPAR, any other `>` header
    /// selects plain PWM blocks (one row of four values per position).
    ///
    pub fn parse(content: &str) -> Result<Self, MotifCalError> {
        let motifs = match detect_format(content)? {
            MotifFormat::Meme => parse_meme(content)?,
            MotifFormat::Jaspar => parse_jaspar(content)?,
            MotifFormat::Pwm => parse_pwm(content)?,
        };

        if motifs.is_empty() {
            return Err(MotifCalError::MotifParse(
                "no motifs found in motif file".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for motif in &motifs {
            if !seen.insert(motif.id.as_str()) {
                return Err(MotifCalError::MotifParse(format!(
                    "duplicate motif id: {}",
                    motif.id
                )));
            }
        }

        Ok(MotifSet { motifs, path: None })
    }
}

impl TryFrom<&Path> for MotifSet {
    type Error = anyhow::Error;

    ///
    /// Create a new [MotifSet] from a motif file (optionally gzip'd).
    ///
    fn try_from(value: &Path) -> Result<Self> {
        let mut content = String::new();
        get_dynamic_reader(value)?.read_to_string(&mut content)?;
        let mut set = MotifSet::parse(&content)?;
        set.path = Some(value.to_path_buf());
        Ok(set)
    }
}

fn detect_format(content: &str) -> Result<MotifFormat, MotifCalError> {
    let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());
    if content.lines().any(|l| l.trim_start().starts_with("MEME version")) {
        return Ok(MotifFormat::Meme);
    }
    match lines.next() {
        Some(first) if first.starts_with('>') => match lines.next() {
            Some(second) if second.contains('[') => Ok(MotifFormat::Jaspar),
            _ => Ok(MotifFormat::Pwm),
        },
        Some(other) => Err(MotifCalError::MotifParse(format!(
            "unrecognized motif format, first line: {}",
            other
        ))),
        None => Err(MotifCalError::MotifParse("motif file is empty".to_string())),
    }
}

fn parse_row(line: &str, motif: &str) -> Result<Vec<f64>, MotifCalError> {
    line.split(|c: char| c.is_whitespace() || c == '[' || c == ']')
        .filter(|tok| !tok.is_empty())
        .filter(|tok| !matches!(*tok, "A" | "C" | "G" | "T" | "U"))
        .map(|tok| {
            tok.parse::<f64>().map_err(|_| {
                MotifCalError::MotifParse(format!("motif {}: invalid value '{}'", motif, tok))
            })
        })
        .collect()
}

/// Scale a row to probabilities; all-zero rows become uniform.
fn normalize(row: [f64; 4]) -> [f64; 4] {
    let sum: f64 = row.iter().sum();
    if sum <= 0.0 {
        return [0.25; 4];
    }
    [row[0] / sum, row[1] / sum, row[2] / sum, row[3] / sum]
}

fn finish_motif(id: String, matrix: Vec<[f64; 4]>) -> Result<Motif, MotifCalError> {
    if matrix.is_empty() {
        return Err(MotifCalError::MotifParse(format!(
            "motif {}: no matrix rows found",
            id
        )));
    }
    Ok(Motif::new(id, matrix))
}

fn header_id(header: &str, prefix: &str) -> String {
    header
        .trim_start_matches(prefix)
        .split_whitespace()
        .next()
        .unwrap_or("unnamed")
        .to_string()
}

fn parse_meme(content: &str) -> Result<Vec<Motif>, MotifCalError> {
    let mut motifs = Vec::new();
    let mut current: Option<(String, Option<usize>, Vec<[f64; 4]>)> = None;
    let mut in_matrix = false;

    for line in content.lines().map(str::trim) {
        if line.starts_with("MOTIF") {
            if let Some((id, width, matrix)) = current.take() {
                motifs.push(check_width(id, width, matrix)?);
            }
            current = Some((header_id(line, "MOTIF"), None, Vec::new()));
            in_matrix = false;
            continue;
        }

        let Some((id, width, matrix)) = current.as_mut() else {
            continue;
        };

        if line.starts_with("letter-probability matrix") {
            *width = line
                .split_once("w=")
                .and_then(|(_, rest)| rest.split_whitespace().next())
                .and_then(|w| w.parse::<usize>().ok());
            in_matrix = true;
            continue;
        }

        if !in_matrix {
            continue;
        }
        if line.is_empty() || line.starts_with("URL") {
            in_matrix = false;
            continue;
        }

        let values = parse_row(line, id)?;
        if values.len() != 4 {
            return Err(MotifCalError::MotifParse(format!(
                "motif {}: expected 4 values per row, found {}",
                id,
                values.len()
            )));
        }
        matrix.push(normalize([values[0], values[1], values[2], values[3]]));
    }

    if let Some((id, width, matrix)) = current.take() {
        motifs.push(check_width(id, width, matrix)?);
    }

    Ok(motifs)
}

fn check_width(
    id: String,
    width: Option<usize>,
    matrix: Vec<[f64; 4]>,
) -> Result<Motif, MotifCalError> {
    if let Some(w) = width {
        if w != matrix.len() {
            return Err(MotifCalError::MotifParse(format!(
                "motif {}: expected {} rows but found {}",
                id,
                w,
                matrix.len()
            )));
        }
    }
    finish_motif(id, matrix)
}

fn parse_jaspar(content: &str) -> Result<Vec<Motif>, MotifCalError> {
    let mut motifs = Vec::new();
    let mut current: Option<(String, Vec<Vec<f64>>)> = None;

    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with('>') {
            if let Some((id, columns)) = current.take() {
                motifs.push(transpose_jaspar(id, columns)?);
            }
            current = Some((header_id(line, ">"), Vec::new()));
            continue;
        }
        let Some((id, columns)) = current.as_mut() else {
            return Err(MotifCalError::MotifParse(format!(
                "matrix row before any header: {}",
                line
            )));
        };
        columns.push(parse_row(line, id)?);
    }

    if let Some((id, columns)) = current.take() {
        motifs.push(transpose_jaspar(id, columns)?);
    }

    Ok(motifs)
}

/// JASPAR stores one row per base; turn it into one row per position.
fn transpose_jaspar(id: String, rows: Vec<Vec<f64>>) -> Result<Motif, MotifCalError> {
    if rows.len() != 4 {
        return Err(MotifCalError::MotifParse(format!(
            "motif {}: expected 4 base rows, found {}",
            id,
            rows.len()
        )));
    }
    let width = rows[0].len();
    if rows.iter().any(|r| r.len() != width) {
        return Err(MotifCalError::MotifParse(format!(
            "motif {}: base rows have different lengths",
            id
        )));
    }
    let matrix = (0..width)
        .map(|pos| normalize([rows[0][pos], rows[1][pos], rows[2][pos], rows[3][pos]]))
        .collect();
    finish_motif(id, matrix)
}

fn parse_pwm(content: &str) -> Result<Vec<Motif>, MotifCalError> {
    let mut motifs = Vec::new();
    let mut current: Option<(String, Vec<[f64; 4]>)> = None;

    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('>') {
            if let Some((id, matrix)) = current.take() {
                motifs.push(finish_motif(id, matrix)?);
            }
            current = Some((header_id(line, ">"), Vec::new()));
            continue;
        }
        let Some((id, matrix)) = current.as_mut() else {
            return Err(MotifCalError::MotifParse(format!(
                "matrix row before any header: {}",
                line
            )));
        };
        let values = parse_row(line, id)?;
        if values.len() != 4 {
            return Err(MotifCalError::MotifParse(format!(
                "motif {}: expected 4 values per row, found {}",
                id,
                values.len()
            )));
        }
        matrix.push(normalize([values[0], values[1], values[2], values[3]]));
    }

    if let Some((id, matrix)) = current.take() {
        motifs.push(finish_motif(id, matrix)?);
    }

    Ok(motifs)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    const MEME: &str = "MEME version 4

ALPHABET= ACGT

MOTIF MA0139.1 CTCF
letter-probability matrix: alength= 4 w= 3 nsites= 20 E= 0
 0.1 0.2 0.3 0.4
 0.0 1.0 0.0 0.0
 0.25 0.25 0.25 0.25

MOTIF GATA1
letter-probability matrix: alength= 4 w= 2
 0.0 0.0 1.0 0.0
 1.0 0.0 0.0 0.0
URL http://example.org
";

    const JASPAR: &str = ">MA0004.1 Arnt
A  [ 4 19  0  0  0  0 ]
C  [16  0 20  0  0  0 ]
G  [ 0  1  0 20  0 20 ]
T  [ 0  0  0  0 20  0 ]
";

    const PWM: &str = ">sox2
0.7 0.1 0.1 0.1
1 0 0 0
>oct4
0 0 0 4
";

    #[rstest]
    fn test_parse_meme() {
        let set = MotifSet::parse(MEME).unwrap();
        assert_eq!(set.ids(), vec!["MA0139.1", "GATA1"]);
        assert_eq!(set.motifs[0].len(), 3);
        assert_eq!(set.motifs[1].consensus(), "GA");
    }

    #[rstest]
    fn test_parse_jaspar() {
        let set = MotifSet::parse(JASPAR).unwrap();
        assert_eq!(set.len(), 1);
        let motif = &set.motifs[0];
        assert_eq!(motif.id, "MA0004.1");
        assert_eq!(motif.len(), 6);
        assert_eq!(motif.consensus(), "CACGTG");
        assert_eq!(motif.matrix[0], [0.2, 0.8, 0.0, 0.0]);
    }

    #[rstest]
    fn test_parse_pwm() {
        let set = MotifSet::parse(PWM).unwrap();
        assert_eq!(set.ids(), vec!["sox2", "oct4"]);
        assert_eq!(set.get("oct4").unwrap().matrix, vec![[0.0, 0.0, 0.0, 1.0]]);
    }

    #[rstest]
    #[case("")]
    #[case("hello world\n")]
    #[case(">a\n0.1 0.2 0.3\n")]
    #[case(">a\n1 0 0 0\n>a\n0 1 0 0\n")]
    #[case("MEME version 4\nMOTIF x\nletter-probability matrix: w= 2\n0.25 0.25 0.25 0.25\n")]
    fn test_parse_rejects(#[case] content: &str) {
        assert!(matches!(
            MotifSet::parse(content),
            Err(MotifCalError::MotifParse(_))
        ));
    }
}
