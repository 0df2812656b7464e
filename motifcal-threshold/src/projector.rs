use std::collections::HashMap;
use std::str::FromStr;

use motifcal_core::models::{ClassifiedHit, GenomicCoordinates, SequenceRecord, SequenceSet, Strand};
use motifcal_core::utils::parse_genomic_id;
use motifcal_core::PipelineWarning;

///
/// How a scanner reports offsets of reverse-strand matches.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrandFrame {
    /// Offsets always count from the start of the forward sequence.
    #[default]
    Forward,
    /// Reverse-strand offsets count from the end of the sequence.
    StrandRelative,
}

impl FromStr for StrandFrame {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forward" => Ok(StrandFrame::Forward),
            "strand" | "strand-relative" | "strand_relative" => Ok(StrandFrame::StrandRelative),
            _ => Err(format!("Invalid strand frame: {}", s)),
        }
    }
}

/// Projected coordinates of one hit, with a warning when they are only relative.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub coordinates: GenomicCoordinates,
    pub warning: Option<PipelineWarning>,
}

///
/// Maps in-sequence hit offsets to genome coordinates.
///
#[derive(Debug, Clone, Default)]
pub struct CoordinateProjector {
    pub frame: StrandFrame,
}

impl CoordinateProjector {
    pub fn new(frame: StrandFrame) -> Self {
        Self { frame }
    }

    /// Forward-frame `[start, end)` of a hit within its sequence.
    fn forward_offsets(&self, hit: &ClassifiedHit, seq_len: Option<u64>) -> (u64, u64) {
        let record = &hit.record;
        match (self.frame, record.strand, seq_len) {
            (StrandFrame::StrandRelative, Strand::Reverse, Some(len)) if record.end <= len => {
                (len - record.end, len - record.start)
            }
            _ => (record.start, record.end),
        }
    }

    ///
    /// Project one hit. Anchors, in order of preference: the peak summit and
    /// extension of the sequence, a `chrom:start-end` locus in the sequence
    /// id, and finally the sequence start itself (flagged imprecise).
    ///
    pub fn project(&self, hit: &ClassifiedHit, sequence: Option<&SequenceRecord>) -> Projection {
        let seq_id = hit.sequence_id();
        let seq_len = sequence.map(|s| s.len() as u64);
        let (start, end) = self.forward_offsets(hit, seq_len);
        let locus = parse_genomic_id(seq_id);

        let imprecise = |reason: &str| Projection {
            coordinates: GenomicCoordinates {
                chrom: seq_id.to_string(),
                start,
                end,
                precise: false,
            },
            warning: Some(PipelineWarning::ImpreciseCoordinates {
                motif: hit.motif_id().to_string(),
                sequence: seq_id.to_string(),
                reason: reason.to_string(),
            }),
        };

        if let Some(center) = sequence.and_then(|s| s.center.as_ref()) {
            let chrom = center
                .chrom
                .clone()
                .or_else(|| locus.as_ref().map(|(chrom, _, _)| chrom.clone()));
            return match (chrom, center.sequence_origin()) {
                (Some(chrom), Some(origin)) => Projection {
                    coordinates: GenomicCoordinates {
                        chrom,
                        start: origin + start,
                        end: origin + end,
                        precise: true,
                    },
                    warning: None,
                },
                (None, _) => imprecise("peak summit has no chromosome"),
                (_, None) => imprecise("peak extension runs past the chromosome start"),
            };
        }

        match locus {
            Some((chrom, locus_start, _)) => Projection {
                coordinates: GenomicCoordinates {
                    chrom,
                    start: locus_start + start,
                    end: locus_start + end,
                    precise: true,
                },
                warning: None,
            },
            None => imprecise("no summit metadata and no locus in sequence id"),
        }
    }

    ///
    /// Project every hit of a classified set in place, returning the
    /// warnings for hits that could only be placed relative to their
    /// sequence.
    ///
    pub fn project_all(&self, hits: &mut [ClassifiedHit], set: &SequenceSet) -> Vec<PipelineWarning> {
        let index: HashMap<&str, &SequenceRecord> =
            set.records.iter().map(|r| (r.id.as_str(), r)).collect();

        let mut warnings = Vec::new();
        for hit in hits.iter_mut() {
            let sequence = index.get(hit.sequence_id()).copied();
            let projection = self.project(hit, sequence);
            hit.coordinates = Some(projection.coordinates);
            warnings.extend(projection.warning);
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use motifcal_core::models::{MatchRecord, PeakCenter, SetKind};
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn hit(seq: &str, start: u64, end: u64, strand: Strand) -> ClassifiedHit {
        ClassifiedHit::new(
            MatchRecord {
                motif_id: "m1".to_string(),
                sequence_id: seq.to_string(),
                kind: SetKind::Input,
                start,
                end,
                strand,
                score: 10.0,
            },
            1,
        )
    }

    fn peak(id: &str, summit: u64, extension: u64) -> SequenceRecord {
        let mut record = SequenceRecord::new(id, vec![b'A'; (2 * extension) as usize]);
        record.center = Some(PeakCenter::new(Some("chr1".to_string()), summit, extension));
        record
    }

    #[rstest]
    #[case(0)]
    #[case(17)]
    #[case(390)]
    fn test_summit_projection_forward(#[case] offset: u64) {
        let sequence = peak("p1", 10_000, 200);
        let projection = CoordinateProjector::default()
            .project(&hit("p1", offset, offset + 10, Strand::Forward), Some(&sequence));
        assert_eq!(projection.coordinates.start, 10_000 - 200 + offset);
        assert_eq!(projection.coordinates.end, 10_000 - 200 + offset + 10);
        assert_eq!(projection.coordinates.chrom, "chr1");
        assert!(projection.coordinates.precise);
        assert_eq!(projection.warning, None);
    }

    #[rstest]
    fn test_strand_relative_reverse_is_mirrored() {
        let sequence = peak("p1", 10_000, 200);
        let projector = CoordinateProjector::new(StrandFrame::StrandRelative);

        let forward = projector.project(&hit("p1", 17, 27, Strand::Forward), Some(&sequence));
        let reverse = projector.project(&hit("p1", 17, 27, Strand::Reverse), Some(&sequence));

        assert_eq!(forward.coordinates.start, 9_800 + 17);
        // sequence is 400 bp: reverse offset 17..27 covers forward 373..383
        assert_eq!(reverse.coordinates.start, 9_800 + 373);
        assert_eq!(reverse.coordinates.end, 9_800 + 383);

        // in the forward frame strand does not move the hit
        let plain = CoordinateProjector::default()
            .project(&hit("p1", 17, 27, Strand::Reverse), Some(&sequence));
        assert_eq!(plain.coordinates.start, 9_800 + 17);
    }

    #[rstest]
    fn test_locus_in_sequence_id() {
        let projection = CoordinateProjector::default()
            .project(&hit("chr3:5000-5400", 100, 110, Strand::Forward), None);
        assert_eq!(
            projection.coordinates,
            GenomicCoordinates {
                chrom: "chr3".to_string(),
                start: 5100,
                end: 5110,
                precise: true
            }
        );
    }

    #[rstest]
    fn test_no_metadata_is_imprecise() {
        let sequence = SequenceRecord::new("peak_9", b"ACGTACGTAC".to_vec());
        let projection = CoordinateProjector::default()
            .project(&hit("peak_9", 2, 8, Strand::Forward), Some(&sequence));
        assert_eq!(projection.coordinates.start, 2);
        assert!(!projection.coordinates.precise);
        assert!(matches!(
            projection.warning,
            Some(PipelineWarning::ImpreciseCoordinates { .. })
        ));
    }

    #[rstest]
    fn test_project_all() {
        let set = SequenceSet::new(
            "peaks",
            SetKind::Input,
            vec![peak("p1", 1_000, 100), SequenceRecord::new("p2", b"ACGT".to_vec())],
        );
        let mut hits = vec![hit("p1", 5, 15, Strand::Forward), hit("p2", 0, 4, Strand::Forward)];
        let warnings = CoordinateProjector::default().project_all(&mut hits, &set);
        assert_eq!(warnings.len(), 1);
        assert_eq!(hits[0].coordinates.as_ref().unwrap().start, 905);
        assert!(!hits[1].coordinates.as_ref().unwrap().precise);
    }
}
