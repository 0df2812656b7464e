//! UCSC track hub descriptors for the BED tracks of a run.
//!
//! Only the text files are produced; converting the BED tracks to bigBed is left to the UCSC
//! `bedToBigBed` tool, which needs a chrom.sizes file this crate never sees.
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::report::write_atomic;

pub const HUB_FILE: &str = "hub.txt";
pub const GENOMES_FILE: &str = "genomes.txt";
pub const TRACKDB_FILE: &str = "trackDb.txt";

/// One bigBed track stanza of `trackDb.txt`.
#[derive(Debug, Clone)]
pub struct HubTrack {
    pub name: String,
    pub label: String,
    /// Path of the bigBed file relative to `trackDb.txt`.
    pub big_data_url: String,
}

impl HubTrack {
    pub fn for_set(set_id: &str) -> Self {
        Self {
            name: set_id.to_string(),
            label: format!("{} motif hits", set_id),
            big_data_url: format!("../{}.bb", set_id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HubDescriptor {
    pub name: String,
    pub genome: String,
    pub email: String,
    pub tracks: Vec<HubTrack>,
}

pub fn render_hub_txt<W: Write + ?Sized>(hub: &HubDescriptor, w: &mut W) -> std::io::Result<()> {
    writeln!(w, "hub {}", hub.name)?;
    writeln!(w, "shortLabel {}", hub.name)?;
    writeln!(w, "longLabel {} calibrated motif hits", hub.name)?;
    writeln!(w, "genomesFile {}", GENOMES_FILE)?;
    writeln!(w, "email {}", hub.email)
}

pub fn render_genomes_txt<W: Write + ?Sized>(hub: &HubDescriptor, w: &mut W) -> std::io::Result<()> {
    writeln!(w, "genome {}", hub.genome)?;
    writeln!(w, "trackDb {}/{}", hub.genome, TRACKDB_FILE)
}

pub fn render_trackdb<W: Write + ?Sized>(hub: &HubDescriptor, w: &mut W) -> std::io::Result<()> {
    for (i, track) in hub.tracks.iter().enumerate() {
        if i > 0 {
            writeln!(w)?;
        }
        writeln!(w, "track {}", track.name)?;
        writeln!(w, "bigDataUrl {}", track.big_data_url)?;
        writeln!(w, "shortLabel {}", track.name)?;
        writeln!(w, "longLabel {}", track.label)?;
        writeln!(w, "type bigBed 9")?;
        writeln!(w, "itemRgb on")?;
        writeln!(w, "visibility dense")?;
    }
    Ok(())
}

///
/// Write `hub.txt`, `genomes.txt` and `<genome>/trackDb.txt` under `dir`.
/// Returns the paths written.
///
pub fn write_hub(dir: &Path, hub: &HubDescriptor) -> Result<Vec<PathBuf>> {
    let hub_path = dir.join(HUB_FILE);
    let genomes_path = dir.join(GENOMES_FILE);
    let trackdb_path = dir.join(&hub.genome).join(TRACKDB_FILE);

    write_atomic(&hub_path, |w| render_hub_txt(hub, w))?;
    write_atomic(&genomes_path, |w| render_genomes_txt(hub, w))?;
    write_atomic(&trackdb_path, |w| render_trackdb(hub, w))?;

    log::info!("Track hub written to {}", dir.display());
    Ok(vec![hub_path, genomes_path, trackdb_path])
}
