use std::path::PathBuf;

use clap::{Arg, Command, value_parser};

pub const HUB_CMD: &str = "hub";

pub fn create_hub_cli() -> Command {
    Command::new(HUB_CMD)
        .about("Write UCSC track hub descriptors for the BED reports in a directory.")
        .arg(
            Arg::new("dir")
                .long("dir")
                .short('d')
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Directory holding the .bed reports; hub files are written here"),
        )
        .arg(
            Arg::new("genome")
                .long("genome")
                .short('g')
                .required(true)
                .help("Genome assembly, e.g. hg38"),
        )
        .arg(Arg::new("name").long("name").help("Hub name [default: directory name]"))
        .arg(
            Arg::new("email")
                .long("email")
                .required(true)
                .help("Contact email listed in hub.txt"),
        )
}
