use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, value_parser};

use crate::options::{classification_args, motif_arg, outdir_arg, range_arg, scanner_arg};

pub const ANNOTATE_CMD: &str = "annotate";

pub fn create_annotate_cli() -> Command {
    Command::new(ANNOTATE_CMD)
        .about("Classify scanner matches on an input set against a cutoffs table and write reports.")
        .arg(motif_arg().required(true))
        .arg(
            Arg::new("cutoffs")
                .long("cutoffs")
                .short('c')
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Cutoffs table written by the calibrate subcommand"),
        )
        .arg(
            Arg::new("input")
                .long("input")
                .short('i')
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Input FASTA file"),
        )
        .arg(
            Arg::new("matches")
                .long("matches")
                .required(true)
                .action(ArgAction::Append)
                .value_parser(value_parser!(PathBuf))
                .help("Scanner output on the input set (repeatable)"),
        )
        .arg(
            Arg::new("id")
                .long("id")
                .help("Name of the input set in reports [default: FASTA file stem]"),
        )
        .arg(scanner_arg())
        .arg(range_arg().required(true))
        .args(classification_args())
        .arg(outdir_arg())
}
