use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use rstest::*;
use tempfile::tempdir;

use motifcal_core::PipelineWarning;
use motifcal_core::models::CutoffStatus;
use motifcal_threshold::config::{InputSource, PipelineConfig};
use motifcal_threshold::consts::BACKGROUND_SAMPLE_FILE;
use motifcal_threshold::report::read_cutoffs;
use motifcal_threshold::{RunContext, calibrate, load_motifs, prepare_background, run};

#[fixture]
fn path_to_data() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../tests/data")
}

#[fixture]
fn yaml_config(path_to_data: PathBuf) -> PipelineConfig {
    PipelineConfig::from_path(&path_to_data.join("config.yaml")).unwrap()
}

mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    fn test_full_run(mut yaml_config: PipelineConfig) {
        let out = tempdir().unwrap();
        yaml_config.outdir = out.path().to_path_buf();
        let ctx = RunContext::new(yaml_config.seed).unwrap();
        let output = run(&yaml_config, &ctx).unwrap();

        assert_eq!(output.seed, 42);

        let m1 = &output.cutoffs["M1"];
        assert_eq!(m1.score, 10.0);
        assert_eq!(m1.achieved_fpr, Some(0.1));
        assert_eq!(m1.status, CutoffStatus::Ok);
        assert_eq!(m1.background_sequences, 10);
        assert_eq!(output.cutoffs["M2"].status, CutoffStatus::NoBackgroundMatches);
        assert_eq!(output.cutoffs["M2"].score, 16.0);
        assert_eq!(output.cutoffs["M3"].status, CutoffStatus::NotAchieved);
        assert_eq!(output.cutoffs["M3"].score, 16.0);

        assert_eq!(output.hits.count("M1", "peaks"), Some(3));
        assert_eq!(output.hits.count("M2", "peaks"), Some(1));
        assert_eq!(output.hits.count("M3", "peaks"), Some(0));

        let kinds: Vec<&str> = output
            .warnings
            .iter()
            .map(|w| match w {
                PipelineWarning::NoBackgroundMatches { .. } => "no_background",
                PipelineWarning::ThresholdNotAchieved { .. } => "not_achieved",
                PipelineWarning::ImpreciseCoordinates { .. } => "imprecise",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds.len(), 3);
        assert!(kinds.contains(&"no_background"));
        assert!(kinds.contains(&"not_achieved"));
        assert!(kinds.contains(&"imprecise"));

        let gff = fs::read_to_string(out.path().join("peaks.gff")).unwrap();
        let lines: Vec<&str> = gff.lines().collect();
        assert_eq!(lines[0], "##gff-version 3");
        assert_eq!(
            lines[1],
            "chr1\tmotifcal\tTF_binding_site\t4991\t4996\t14.2\t+\t.\tID=M1_peak1_1;motif=M1;rank=1"
        );
        assert_eq!(lines.len(), 1 + 4);

        let bed = fs::read_to_string(out.path().join("peaks.bed")).unwrap();
        assert!(bed.contains("chr2\t1020\t1026\tM1\t"));
        assert!(bed.contains("# M1_peak2_1 placed relative to sequence peak2"));

        let stats = fs::read_to_string(out.path().join("stats.tsv")).unwrap();
        assert_eq!(stats, "motif\tpeaks\nM1\t3\nM2\t1\nM3\t0\n");

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.path().join("summary.json")).unwrap()).unwrap();
        assert_eq!(summary["seed"], 42);
        assert_eq!(summary["warnings"].as_array().unwrap().len(), 3);

        let reread = read_cutoffs(&out.path().join("cutoffs.tsv")).unwrap();
        assert_eq!(reread, output.cutoffs);

        // nothing half-written is left behind
        assert!(
            fs::read_dir(out.path())
                .unwrap()
                .all(|e| !e.unwrap().file_name().to_string_lossy().ends_with(".partial"))
        );
    }

    #[rstest]
    fn test_params_file_matches_yaml(path_to_data: PathBuf, yaml_config: PipelineConfig) {
        let params = PipelineConfig::from_path(&path_to_data.join("params.txt")).unwrap();
        assert_eq!(params, yaml_config);
    }

    #[rstest]
    fn test_besthit_and_uniquestats(mut yaml_config: PipelineConfig) {
        let out = tempdir().unwrap();
        yaml_config.outdir = out.path().to_path_buf();
        yaml_config.besthit = 2;
        yaml_config.uniquestats = true;
        let ctx = RunContext::new(yaml_config.seed).unwrap();
        let output = run(&yaml_config, &ctx).unwrap();

        let peaks = &output.classifications[0];
        let m1: Vec<(&str, usize, f64)> = peaks
            .hits_for("M1")
            .map(|h| (h.sequence_id(), h.rank, h.score()))
            .collect();
        assert_eq!(
            m1,
            vec![
                ("peak1", 1, 14.2),
                ("peak1", 2, 12.0),
                ("peak2", 1, 11.0),
                ("chr2:1000-1040", 1, 13.5),
            ]
        );
        // statistics still count each sequence once
        assert_eq!(output.hits.count("M1", "peaks"), Some(3));
    }

    #[rstest]
    fn test_monotonic_cutoffs(yaml_config: PipelineConfig) {
        let motifs = load_motifs(yaml_config.motif.as_ref().unwrap()).unwrap();
        let ctx = RunContext::new(Some(1)).unwrap();
        let background = prepare_background(&yaml_config, 3, &ctx).unwrap();

        let mut previous = f64::MIN;
        for fpr in [0.6, 0.4, 0.2, 0.1, 0.05] {
            let config = PipelineConfig {
                fpr,
                ..yaml_config.clone()
            };
            let cutoffs = calibrate(&config, &motifs, background.as_ref(), &ctx).unwrap();
            assert!(cutoffs["M1"].score >= previous);
            previous = cutoffs["M1"].score;
        }
        assert_eq!(previous, 16.0);
    }

    #[rstest]
    fn test_pwmscan_justscan(path_to_data: PathBuf) {
        let out = tempdir().unwrap();
        let config = PipelineConfig {
            input: vec![InputSource::Detailed {
                fasta: path_to_data.join("peaks.fa"),
                matches: vec![
                    path_to_data.join("pwmscan/M1.bed"),
                    path_to_data.join("pwmscan/M2.bed"),
                ],
                id: Some("chip".to_string()),
            }],
            motif: Some(path_to_data.join("motifs.meme")),
            scanner: "pwmscan".to_string(),
            range: Some("4:1:16".to_string()),
            justscan: true,
            outdir: out.path().to_path_buf(),
            ..PipelineConfig::default()
        };
        let ctx = RunContext::new(Some(5)).unwrap();
        let output = run(&config, &ctx).unwrap();

        assert!(output.cutoffs.values().all(|c| c.score == 4.0 && c.status == CutoffStatus::JustScan));
        assert_eq!(output.hits.count("M1", "chip"), Some(2));
        assert_eq!(output.hits.count("M2", "chip"), Some(1));
        assert!(out.path().join("chip.bed").exists());
    }

    #[rstest]
    fn test_pool_sampling_is_seeded(path_to_data: PathBuf) {
        let sample_for = |seed: u64| {
            let out = tempdir().unwrap();
            let config = PipelineConfig {
                background: Some(path_to_data.join("pool.fa")),
                times: 2,
                length: 40,
                outdir: out.path().to_path_buf(),
                ..PipelineConfig::default()
            };
            let ctx = RunContext::new(Some(seed)).unwrap();
            let background = prepare_background(&config, 3, &ctx).unwrap().unwrap();
            let written = background.written_to.clone().unwrap();
            // the published sample is the one staged in the run workdir
            assert_eq!(
                fs::read_to_string(&written).unwrap(),
                fs::read_to_string(ctx.temp_path(BACKGROUND_SAMPLE_FILE)).unwrap()
            );
            background
                .set
                .records
                .iter()
                .map(|r| r.id.clone())
                .collect::<Vec<_>>()
        };

        let first = sample_for(9);
        assert_eq!(first.len(), 6);
        assert!(first.iter().all(|id| !id.contains("short1")));
        assert_eq!(first, sample_for(9));
    }

    #[rstest]
    fn test_missing_background_matches_fail_fast(path_to_data: PathBuf) {
        let out = tempdir().unwrap();
        let config = PipelineConfig {
            motif: Some(path_to_data.join("motifs.meme")),
            input: vec![InputSource::Path(path_to_data.join("peaks.fa"))],
            background: Some(path_to_data.join("pool.fa")),
            range: Some("4:16".to_string()),
            times: 2,
            length: 40,
            outdir: out.path().to_path_buf(),
            ..PipelineConfig::default()
        };
        let ctx = RunContext::new(Some(2)).unwrap();
        let err = run(&config, &ctx).unwrap_err();
        assert!(err.to_string().contains("background matches are required"));
        assert!(out.path().join("background.sampled.fa").exists());
    }

    #[rstest]
    fn test_justscan_ignores_small_background_sample(mut yaml_config: PipelineConfig) {
        let out = tempdir().unwrap();
        yaml_config.outdir = out.path().to_path_buf();
        yaml_config.times = 5;
        yaml_config.justscan = true;
        let ctx = RunContext::new(yaml_config.seed).unwrap();

        assert!(prepare_background(&yaml_config, 3, &ctx).unwrap().is_none());
        let output = run(&yaml_config, &ctx).unwrap();
        assert!(
            output
                .cutoffs
                .values()
                .all(|c| c.score == 4.0 && c.status == CutoffStatus::JustScan)
        );
    }

    #[rstest]
    fn test_insufficient_background_sample(mut yaml_config: PipelineConfig) {
        yaml_config.times = 5;
        let ctx = RunContext::new(yaml_config.seed).unwrap();
        let err = run(&yaml_config, &ctx).unwrap_err();
        assert!(err.to_string().contains("Insufficient background"));
    }
}
