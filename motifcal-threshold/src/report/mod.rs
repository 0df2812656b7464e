//! Text renderers for calibration and classification results.
//!
//! Every file is written through [write_atomic]: content goes to a `.partial` temporary file in
//! the destination directory and is renamed into place only once complete.
pub mod features;
pub mod hub;
pub mod tables;

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

// re-exports
pub use features::*;
pub use hub::*;
pub use tables::*;

pub fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let tmp = tempfile::Builder::new()
        .prefix(".motifcal-")
        .suffix(".partial")
        .tempfile_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

    {
        let mut writer = BufWriter::new(tmp.as_file());
        write(&mut writer)?;
        writer.flush()?;
    }

    tmp.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use tempfile::tempdir;

    #[rstest]
    fn test_write_atomic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.tsv");
        write_atomic(&path, |w| writeln!(w, "a\tb")).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\tb\n");
    }

    #[rstest]
    fn test_failed_write_leaves_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.tsv");
        let result = write_atomic(&path, |w| {
            writeln!(w, "half")?;
            Err(std::io::Error::other("interrupted"))
        });
        assert!(result.is_err());
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
