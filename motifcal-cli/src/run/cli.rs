use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, value_parser};

use crate::options::{
    classification_args, length_arg, motif_arg, outdir_arg, range_arg, scanner_arg, seed_arg,
    times_arg,
};

pub const RUN_CMD: &str = "run";

pub fn create_run_cli() -> Command {
    Command::new(RUN_CMD)
        .about("Run the full pipeline from a config file: sample, calibrate, classify, report.")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Config file (.yaml, .toml or tab-delimited parameters)"),
        )
        .arg(motif_arg())
        .arg(
            Arg::new("input")
                .long("input")
                .short('i')
                .action(ArgAction::Append)
                .value_parser(value_parser!(PathBuf))
                .help("Input FASTA file(s), replacing those of the config"),
        )
        .arg(
            Arg::new("matches")
                .long("matches")
                .action(ArgAction::Append)
                .value_parser(value_parser!(PathBuf))
                .help("Scanner output on a single --input (repeatable)"),
        )
        .arg(
            Arg::new("background")
                .long("background")
                .short('b')
                .value_parser(value_parser!(PathBuf))
                .help("Background pool FASTA"),
        )
        .arg(
            Arg::new("background-sample")
                .long("background-sample")
                .value_parser(value_parser!(PathBuf))
                .help("Already drawn background sample FASTA"),
        )
        .arg(
            Arg::new("background-matches")
                .long("background-matches")
                .action(ArgAction::Append)
                .value_parser(value_parser!(PathBuf))
                .help("Scanner output on the background sample (repeatable)"),
        )
        .arg(scanner_arg())
        .arg(range_arg())
        .arg(
            Arg::new("fpr")
                .long("fpr")
                .value_parser(value_parser!(f64))
                .help("Target false positive rate [default: 0.05]"),
        )
        .arg(times_arg())
        .arg(length_arg())
        .arg(seed_arg())
        .arg(
            Arg::new("no-replace")
                .long("no-replace")
                .action(ArgAction::SetTrue)
                .help("Fail instead of sampling with replacement when the pool is too small"),
        )
        .arg(
            Arg::new("justscan")
                .long("justscan")
                .action(ArgAction::SetTrue)
                .help("Skip calibration and use the lower bound of the range as cutoff"),
        )
        .args(classification_args())
        .arg(outdir_arg())
        .arg(
            Arg::new("print-config")
                .long("print-config")
                .action(ArgAction::SetTrue)
                .help("Print the resolved config as YAML and exit"),
        )
}
