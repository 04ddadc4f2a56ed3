use std::process::ExitCode;

use anyhow::{Context, Error};
use clap::Parser;
use log::{error, info};

use diskplan::{cli::Cli, validation, Commands};
use diskplan_api::error::{DiskplanError, DiskplanResultExt};

fn run_diskplan(args: &Cli) -> Result<(), DiskplanError> {
    // Log version ASAP
    info!("Diskplan version: {}", diskplan::DISKPLAN_VERSION);

    let res = match &args.command {
        Commands::Validate { request } => validation::validate_request_file(request),

        Commands::Plan {
            request,
            inventory,
            os,
        } => match diskplan::resolve_request(request, inventory, os)? {
            Some(plan) => diskplan::write_output(&plan, None),
            None => Ok(()),
        },

        Commands::Compile {
            request,
            inventory,
            os,
            format,
            output,
            sequential_ids,
            error,
        } => {
            let res = diskplan::compile_request(request, inventory, os, *format, *sequential_ids)
                .and_then(|graph| match graph {
                    Some(graph) => diskplan::write_output(&graph, output.as_deref()),
                    None => Ok(()),
                });

            // return error if requested
            if let Some(error_path) = error.as_ref() {
                if let Err(e) = &res {
                    if let Err(e2) =
                        std::fs::write(error_path, serde_yaml::to_string(&e).unwrap_or_default())
                    {
                        error!("Failed to write error to file: {e2}");
                    }
                }
            }

            res
        }
    };
    res.message(format!("Failed to execute '{}' command", args.command))
}

fn setup_logging(args: &Cli) -> Result<(), Error> {
    env_logger::builder()
        .format_timestamp(None)
        .filter_level(args.verbosity)
        .try_init()
        .context("Logger already registered")
}

fn main() -> ExitCode {
    // Parse args
    let args = Cli::parse();

    if let Err(e) = setup_logging(&args) {
        eprintln!("Failed to initialize logging: {e:?}");
        return ExitCode::from(1);
    }

    if let Err(e) = run_diskplan(&args) {
        error!("Diskplan failed: {e:?}");
        return ExitCode::from(2);
    }
    ExitCode::SUCCESS
}
