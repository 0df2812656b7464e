use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use motifcal_core::errors::MotifCalError;
use motifcal_core::models::{ClassifiedHit, Cutoff, MatchRecord, Strand};
use motifcal_core::PipelineWarning;

use crate::calibrator::CutoffTable;
use crate::counts::HitCountMatrix;

///
/// Applies calibrated cutoffs to input matches and keeps the `besthit`
/// best matches per (motif, sequence) pair.
///
#[derive(Debug, Clone)]
pub struct MatchClassifier {
    pub besthit: usize,
    pub uniquestats: bool,
}

/// Classification result of one input sequence set.
#[derive(Debug, Clone, PartialEq)]
pub struct SetClassification {
    pub set_id: String,
    /// Retained hits grouped by motif, then by sequence (first appearance
    /// order), then by rank.
    pub hits: Vec<ClassifiedHit>,
    /// Per-motif count for the statistics report.
    pub stats: BTreeMap<String, u64>,
}

impl SetClassification {
    pub fn hits_for<'a>(&'a self, motif: &'a str) -> impl Iterator<Item = &'a ClassifiedHit> + 'a {
        self.hits.iter().filter(move |h| h.motif_id() == motif)
    }
}

/// Score descending, then start ascending, then forward strand first.
fn rank_order(a: &MatchRecord, b: &MatchRecord) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then(a.start.cmp(&b.start))
        .then_with(|| match (a.strand, b.strand) {
            (Strand::Forward, Strand::Reverse) => Ordering::Less,
            (Strand::Reverse, Strand::Forward) => Ordering::Greater,
            _ => Ordering::Equal,
        })
}

impl MatchClassifier {
    pub fn new(besthit: usize, uniquestats: bool) -> Result<Self, MotifCalError> {
        if besthit == 0 {
            return Err(MotifCalError::configuration("besthit must be at least 1"));
        }
        Ok(Self {
            besthit,
            uniquestats,
        })
    }

    ///
    /// Classify the matches of one motif: drop matches below the cutoff,
    /// rank the rest per sequence and keep the top `besthit`.
    ///
    pub fn classify_motif(&self, matches: &[MatchRecord], cutoff: &Cutoff) -> Vec<ClassifiedHit> {
        let mut order: Vec<&str> = Vec::new();
        let mut per_sequence: HashMap<&str, Vec<&MatchRecord>> = HashMap::new();

        for record in matches.iter().filter(|m| cutoff.passes(m.score)) {
            let key = record.sequence_id.as_str();
            per_sequence
                .entry(key)
                .or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                })
                .push(record);
        }

        let mut hits = Vec::new();
        for key in order {
            if let Some(mut retained) = per_sequence.remove(key) {
                retained.sort_by(|a, b| rank_order(a, b));
                hits.extend(
                    retained
                        .into_iter()
                        .take(self.besthit)
                        .enumerate()
                        .map(|(i, record)| ClassifiedHit::new(record.clone(), i + 1)),
                );
            }
        }
        hits
    }

    ///
    /// Count for the statistics report. With `uniquestats` each sequence with
    /// at least one hit counts once; otherwise every retained hit counts.
    ///
    pub fn stats_count(&self, hits: &[ClassifiedHit]) -> u64 {
        if self.uniquestats {
            hits.iter().filter(|h| h.rank == 1).count() as u64
        } else {
            hits.len() as u64
        }
    }

    ///
    /// Classify all motifs' matches on one input set. Motifs without a
    /// cutoff are skipped with a warning.
    ///
    pub fn classify_set(
        &self,
        set_id: &str,
        matches: &BTreeMap<String, Vec<MatchRecord>>,
        cutoffs: &CutoffTable,
    ) -> (SetClassification, Vec<PipelineWarning>) {
        let mut warnings = Vec::new();
        let mut hits = Vec::new();
        let mut stats = BTreeMap::new();

        for (motif, records) in matches {
            let Some(cutoff) = cutoffs.get(motif) else {
                warnings.push(PipelineWarning::MissingCutoff {
                    motif: motif.clone(),
                    set: set_id.to_string(),
                });
                continue;
            };
            let motif_hits = self.classify_motif(records, cutoff);
            stats.insert(motif.clone(), self.stats_count(&motif_hits));
            hits.extend(motif_hits);
        }

        (
            SetClassification {
                set_id: set_id.to_string(),
                hits,
                stats,
            },
            warnings,
        )
    }
}

///
/// Assemble the motif x set count matrix. Rows follow `motifs`, columns
/// follow `classifications`.
///
pub fn hit_matrix(
    motifs: &[&str],
    classifications: &[SetClassification],
) -> Result<HitCountMatrix, MotifCalError> {
    let mut matrix = HitCountMatrix::new(
        motifs.iter().map(|m| m.to_string()).collect(),
        classifications.iter().map(|c| c.set_id.clone()).collect(),
    );
    for classification in classifications {
        for (motif, count) in &classification.stats {
            matrix
                .set_count(motif, &classification.set_id, *count)
                .map_err(|e| {
                    MotifCalError::Configuration(format!(
                        "hit counts for motif '{}' cannot be reported: {}",
                        motif, e
                    ))
                })?;
        }
    }
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    use motifcal_core::models::{CutoffStatus, SetKind};
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn record(seq: &str, start: u64, score: f64) -> MatchRecord {
        MatchRecord {
            motif_id: "m1".to_string(),
            sequence_id: seq.to_string(),
            kind: SetKind::Input,
            start,
            end: start + 6,
            strand: Strand::Forward,
            score,
        }
    }

    #[fixture]
    fn cutoff() -> Cutoff {
        Cutoff {
            motif_id: "m1".to_string(),
            score: 5.0,
            target_fpr: 0.05,
            achieved_fpr: Some(0.04),
            background_sequences: 100,
            status: CutoffStatus::Ok,
        }
    }

    #[fixture]
    fn matches() -> Vec<MatchRecord> {
        vec![
            record("s2", 40, 7.0),
            record("s1", 30, 6.0),
            record("s1", 10, 9.0),
            record("s1", 20, 6.0),
            record("s1", 5, 4.9),
            record("s2", 12, 7.0),
            record("s3", 1, 2.0),
        ]
    }

    #[rstest]
    fn test_besthit_one(matches: Vec<MatchRecord>, cutoff: Cutoff) {
        let classifier = MatchClassifier::new(1, false).unwrap();
        let hits = classifier.classify_motif(&matches, &cutoff);
        let summary: Vec<(&str, u64, usize)> = hits
            .iter()
            .map(|h| (h.sequence_id(), h.record.start, h.rank))
            .collect();
        // s2 appears first in the stream; its tie at 7.0 is broken by start
        assert_eq!(summary, vec![("s2", 12, 1), ("s1", 10, 1)]);
    }

    #[rstest]
    fn test_besthit_k_ranks_by_score_then_start(matches: Vec<MatchRecord>, cutoff: Cutoff) {
        let classifier = MatchClassifier::new(3, false).unwrap();
        let hits = classifier.classify_motif(&matches, &cutoff);
        let s1: Vec<(u64, f64)> = hits
            .iter()
            .filter(|h| h.sequence_id() == "s1")
            .map(|h| (h.record.start, h.score()))
            .collect();
        assert_eq!(s1, vec![(10, 9.0), (20, 6.0), (30, 6.0)]);
        assert!(hits.iter().all(|h| h.score() >= 5.0));
    }

    #[rstest]
    #[case(1, false, 2)]
    #[case(2, false, 4)]
    #[case(5, false, 5)]
    #[case(5, true, 2)]
    #[case(1, true, 2)]
    fn test_stats_count(
        matches: Vec<MatchRecord>,
        cutoff: Cutoff,
        #[case] besthit: usize,
        #[case] uniquestats: bool,
        #[case] expected: u64,
    ) {
        let classifier = MatchClassifier::new(besthit, uniquestats).unwrap();
        let hits = classifier.classify_motif(&matches, &cutoff);
        assert_eq!(classifier.stats_count(&hits), expected);
        // uniquestats only changes the statistics, never the retained hits
        let plain = MatchClassifier::new(besthit, false).unwrap();
        assert_eq!(hits, plain.classify_motif(&matches, &cutoff));
    }

    #[rstest]
    fn test_besthit_zero_rejected() {
        assert!(matches!(
            MatchClassifier::new(0, false),
            Err(MotifCalError::Configuration(_))
        ));
    }

    #[rstest]
    fn test_classify_set_and_matrix(matches: Vec<MatchRecord>, cutoff: Cutoff) {
        let mut grouped = BTreeMap::new();
        grouped.insert("m1".to_string(), matches.clone());
        grouped.insert("m2".to_string(), matches);
        let mut cutoffs = CutoffTable::new();
        cutoffs.insert("m1".to_string(), cutoff);

        let classifier = MatchClassifier::new(1, false).unwrap();
        let (classification, warnings) = classifier.classify_set("peaks", &grouped, &cutoffs);
        assert_eq!(classification.hits_for("m1").count(), 2);
        assert_eq!(
            warnings,
            vec![PipelineWarning::MissingCutoff {
                motif: "m2".to_string(),
                set: "peaks".to_string()
            }]
        );

        let matrix = hit_matrix(&["m1", "m2"], &[classification.clone()]).unwrap();
        assert_eq!(matrix.count("m1", "peaks"), Some(2));
        assert_eq!(matrix.count("m2", "peaks"), Some(0));

        // a cutoff table naming a motif the motif file lacks
        let err = hit_matrix(&["m2"], &[classification]).unwrap_err();
        assert!(err.to_string().contains("motif 'm1'"));
    }
}
