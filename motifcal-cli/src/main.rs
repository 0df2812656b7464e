mod annotate;
mod calibrate;
mod hub;
mod options;
mod run;
mod sample;

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use env_logger::Env;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const BIN_NAME: &str = "motifcal";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Calibrate motif score cutoffs against a sampled background at a target false positive rate, and classify motif matches with them.")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log debug messages"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .global(true)
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose")
                .help("Only log warnings and errors"),
        )
        .subcommand(sample::cli::create_sample_cli())
        .subcommand(calibrate::cli::create_calibrate_cli())
        .subcommand(annotate::cli::create_annotate_cli())
        .subcommand(run::cli::create_run_cli())
        .subcommand(hub::cli::create_hub_cli())
}

fn init_logging(matches: &ArgMatches) {
    let level = if matches.get_flag("verbose") {
        "debug"
    } else if matches.get_flag("quiet") {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();
    init_logging(&matches);

    match matches.subcommand() {
        //
        // BACKGROUND SAMPLING
        //
        Some((sample::cli::SAMPLE_CMD, matches)) => {
            sample::handlers::run_sample(matches)?;
        }

        //
        // CALIBRATION
        //
        Some((calibrate::cli::CALIBRATE_CMD, matches)) => {
            calibrate::handlers::run_calibrate(matches)?;
        }

        //
        // CLASSIFICATION
        //
        Some((annotate::cli::ANNOTATE_CMD, matches)) => {
            annotate::handlers::run_annotate(matches)?;
        }

        //
        // FULL PIPELINE
        //
        Some((run::cli::RUN_CMD, matches)) => {
            run::handlers::run_pipeline(matches)?;
        }

        //
        // TRACK HUB
        //
        Some((hub::cli::HUB_CMD, matches)) => {
            hub::handlers::run_hub(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
