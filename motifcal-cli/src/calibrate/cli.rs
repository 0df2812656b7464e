use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, value_parser};

use crate::options::{length_arg, motif_arg, range_arg, scanner_arg, times_arg};

pub const CALIBRATE_CMD: &str = "calibrate";

pub fn create_calibrate_cli() -> Command {
    Command::new(CALIBRATE_CMD)
        .about("Compute per-motif score cutoffs from scanner output on a background sample.")
        .arg(motif_arg().required(true))
        .arg(
            Arg::new("background-sample")
                .long("background")
                .short('b')
                .value_parser(value_parser!(PathBuf))
                .help("Background sample FASTA the match files were produced on"),
        )
        .arg(
            Arg::new("background-matches")
                .long("matches")
                .action(ArgAction::Append)
                .value_parser(value_parser!(PathBuf))
                .help("Scanner output on the background sample (repeatable)"),
        )
        .arg(scanner_arg())
        .arg(range_arg().required(true))
        .arg(
            Arg::new("fpr")
                .long("fpr")
                .value_parser(value_parser!(f64))
                .help("Target false positive rate [default: 0.05]"),
        )
        .arg(
            Arg::new("input")
                .long("input")
                .short('i')
                .action(ArgAction::Append)
                .value_parser(value_parser!(PathBuf))
                .help("Input FASTA file(s); checks the background sample is large enough"),
        )
        .arg(times_arg())
        .arg(length_arg())
        .arg(
            Arg::new("justscan")
                .long("justscan")
                .action(ArgAction::SetTrue)
                .help("Skip calibration and use the lower bound of the range as cutoff"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_parser(value_parser!(PathBuf))
                .help("Cutoffs table [default: cutoffs.tsv]"),
        )
}
