use std::ffi::OsStr;
use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    let reader = BufReader::new(file);

    Ok(reader)
}

///
/// Derive a set identifier from a file path: the file name with any `.gz`
/// suffix and one known sequence/table extension removed.
///
pub fn file_stem_id(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed");
    let name = name.strip_suffix(".gz").unwrap_or(name);
    for ext in [".fasta", ".fa", ".fna", ".txt", ".tsv", ".bed"] {
        if let Some(stem) = name.strip_suffix(ext) {
            return stem.to_string();
        }
    }
    name.to_string()
}

///
/// Parse a genomic locus embedded in a sequence identifier.
///
/// Accepts `chrom:start-end` optionally followed by a strand suffix such as
/// `(+)` (bedtools getfasta style). Returns `(chrom, start, end)`.
///
pub fn parse_genomic_id(id: &str) -> Option<(String, u64, u64)> {
    let id = match id.find('(') {
        Some(idx) => &id[..idx],
        None => id,
    };
    let (chrom, span) = id.rsplit_once(':')?;
    let (start, end) = span.split_once('-')?;
    let start = start.replace(',', "").parse::<u64>().ok()?;
    let end = end.replace(',', "").parse::<u64>().ok()?;
    if chrom.is_empty() || end < start {
        return None;
    }
    Some((chrom.to_string(), start, end))
}
