//! Arguments shared by several subcommands and their mapping onto [PipelineConfig].
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, value_parser};

use motifcal_threshold::config::{InputSource, OutputKind, PipelineConfig};

pub fn motif_arg() -> Arg {
    Arg::new("motif")
        .long("motif")
        .short('m')
        .value_parser(value_parser!(PathBuf))
        .help("Motif file (MEME, JASPAR or plain PWM)")
}

pub fn scanner_arg() -> Arg {
    Arg::new("scanner")
        .long("scanner")
        .help("Scanner that produced the match files: fimo or pwmscan")
}

pub fn range_arg() -> Arg {
    Arg::new("range")
        .long("range")
        .short('r')
        .help("Score range scanned for cutoffs, low:high or low:step:high")
}

pub fn times_arg() -> Arg {
    Arg::new("times")
        .long("times")
        .value_parser(value_parser!(usize))
        .help("Background sequences per input sequence [default: 10]")
}

pub fn length_arg() -> Arg {
    Arg::new("length")
        .long("length")
        .value_parser(value_parser!(usize))
        .help("Length of sampled background sequences [default: 400]")
}

pub fn seed_arg() -> Arg {
    Arg::new("seed")
        .long("seed")
        .value_parser(value_parser!(u64))
        .help("Random seed for background sampling (fresh per run when omitted)")
}

pub fn outdir_arg() -> Arg {
    Arg::new("outdir")
        .long("outdir")
        .short('o')
        .value_parser(value_parser!(PathBuf))
        .help("Output directory")
}

/// Options that control classification and report rendering.
pub fn classification_args() -> Vec<Arg> {
    vec![
        Arg::new("besthit")
            .long("besthit")
            .value_parser(value_parser!(usize))
            .help("Matches kept per motif and sequence [default: 1]"),
        Arg::new("uniquestats")
            .long("uniquestats")
            .action(ArgAction::SetTrue)
            .help("Count each sequence once per motif in the statistics"),
        Arg::new("center")
            .long("center")
            .value_parser(value_parser!(PathBuf))
            .help("Tab-delimited peak center table (id, summit, extension)"),
        Arg::new("colext")
            .long("colext")
            .value_delimiter(',')
            .value_parser(value_parser!(usize))
            .help("1-based id,summit,extension columns of the center table [default: 1,2,3]"),
        Arg::new("strand-relative")
            .long("strand-relative")
            .action(ArgAction::SetTrue)
            .help("Reverse-strand offsets count from the end of the sequence"),
        Arg::new("output-types")
            .long("output-types")
            .value_delimiter(',')
            .help("Reports to write: stats,gff,bed [default: all]"),
    ]
}

fn path_list(matches: &ArgMatches, id: &str) -> Option<Vec<PathBuf>> {
    matches
        .try_get_many::<PathBuf>(id)
        .ok()
        .flatten()
        .map(|values| values.cloned().collect())
}

fn one<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str) -> Option<T> {
    matches.try_get_one::<T>(id).ok().flatten().cloned()
}

fn flag(matches: &ArgMatches, id: &str) -> bool {
    matches.try_get_one::<bool>(id).ok().flatten().copied().unwrap_or(false)
}

///
/// Apply every option present on the command line on top of `config`.
/// Options a subcommand does not define are ignored.
///
pub fn apply_overrides(config: &mut PipelineConfig, matches: &ArgMatches) -> Result<()> {
    if let Some(inputs) = path_list(matches, "input") {
        let extra: Vec<PathBuf> = path_list(matches, "matches").unwrap_or_default();
        let id: Option<String> = one(matches, "id");
        config.input = if extra.is_empty() && id.is_none() {
            inputs.into_iter().map(InputSource::Path).collect()
        } else {
            let [fasta] = <[PathBuf; 1]>::try_from(inputs)
                .map_err(|_| anyhow::anyhow!("--matches and --id need exactly one --input"))?;
            vec![InputSource::Detailed {
                fasta,
                matches: extra,
                id,
            }]
        };
    }

    if let Some(motif) = one(matches, "motif") {
        config.motif = Some(motif);
    }
    if let Some(background) = one(matches, "background") {
        config.background = Some(background);
    }
    if let Some(sample) = one(matches, "background-sample") {
        config.background_sample = Some(sample);
    }
    if let Some(paths) = path_list(matches, "background-matches") {
        config.background_matches = paths;
    }
    if let Some(scanner) = one(matches, "scanner") {
        config.scanner = scanner;
    }
    if let Some(range) = one(matches, "range") {
        config.range = Some(range);
    }
    if let Some(fpr) = one(matches, "fpr") {
        config.fpr = fpr;
    }
    if let Some(times) = one(matches, "times") {
        config.times = times;
    }
    if let Some(length) = one(matches, "length") {
        config.length = length;
    }
    if let Some(besthit) = one(matches, "besthit") {
        config.besthit = besthit;
    }
    if flag(matches, "uniquestats") {
        config.uniquestats = true;
    }
    if flag(matches, "justscan") {
        config.justscan = true;
    }
    if let Some(center) = one(matches, "center") {
        config.center = Some(center);
    }
    if let Ok(Some(colext)) = matches.try_get_many::<usize>("colext") {
        config.colext = colext.copied().collect();
    }
    if let Ok(Some(kinds)) = matches.try_get_many::<String>("output-types") {
        config.output = kinds
            .map(|k| OutputKind::from_str(k).map_err(anyhow::Error::msg))
            .collect::<Result<_>>()?;
    }
    if let Some(outdir) = one(matches, "outdir") {
        config.outdir = outdir;
    }
    if let Some(seed) = one(matches, "seed") {
        config.seed = Some(seed);
    }
    if flag(matches, "no-replace") {
        config.replace = false;
    }
    if flag(matches, "strand-relative") {
        config.strand_relative = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::Command;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn command() -> Command {
        Command::new("test")
            .arg(motif_arg())
            .arg(range_arg())
            .arg(
                Arg::new("input")
                    .long("input")
                    .action(ArgAction::Append)
                    .value_parser(value_parser!(PathBuf)),
            )
            .arg(
                Arg::new("matches")
                    .long("matches")
                    .action(ArgAction::Append)
                    .value_parser(value_parser!(PathBuf)),
            )
            .args(classification_args())
    }

    #[rstest]
    fn test_overrides_win_over_config() {
        let mut config = PipelineConfig {
            range: Some("0:10".to_string()),
            besthit: 2,
            ..PipelineConfig::default()
        };
        let matches = command()
            .try_get_matches_from([
                "test",
                "--range",
                "0:0.5:20",
                "--besthit",
                "3",
                "--colext",
                "4,5,6",
                "--output-types",
                "stats,bed",
            ])
            .unwrap();
        apply_overrides(&mut config, &matches).unwrap();
        assert_eq!(config.range.as_deref(), Some("0:0.5:20"));
        assert_eq!(config.besthit, 3);
        assert_eq!(config.colext, vec![4, 5, 6]);
        assert_eq!(config.output, vec![OutputKind::Stats, OutputKind::Bed]);
        // options the command does not define leave the config alone
        assert_eq!(config.times, 10);
    }

    #[rstest]
    fn test_single_input_with_matches() {
        let mut config = PipelineConfig::default();
        let matches = command()
            .try_get_matches_from(["test", "--input", "peaks.fa", "--matches", "a.tsv", "--matches", "b.tsv"])
            .unwrap();
        apply_overrides(&mut config, &matches).unwrap();
        assert_eq!(config.input.len(), 1);
        assert_eq!(config.input[0].matches().len(), 2);
    }

    #[rstest]
    fn test_matches_with_several_inputs_rejected() {
        let mut config = PipelineConfig::default();
        let matches = command()
            .try_get_matches_from(["test", "--input", "a.fa", "--input", "b.fa", "--matches", "a.tsv"])
            .unwrap();
        assert!(apply_overrides(&mut config, &matches).is_err());
    }
}
