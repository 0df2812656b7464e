use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, value_parser};

use crate::options::{length_arg, seed_arg, times_arg};

pub const SAMPLE_CMD: &str = "sample";

pub fn create_sample_cli() -> Command {
    Command::new(SAMPLE_CMD)
        .about("Draw a background sample sized to the input sets and write it as FASTA for scanning.")
        .arg(
            Arg::new("pool")
                .long("pool")
                .short('p')
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Background pool FASTA"),
        )
        .arg(
            Arg::new("input")
                .long("input")
                .short('i')
                .required(true)
                .action(ArgAction::Append)
                .value_parser(value_parser!(PathBuf))
                .help("Input FASTA file(s) the sample is sized to"),
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
            Arg::new("output")
                .long("output")
                .short('o')
                .value_parser(value_parser!(PathBuf))
                .help("Output FASTA [default: background.sampled.fa]"),
        )
}
