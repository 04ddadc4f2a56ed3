use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};

use clap::{Parser, Subcommand};
use log::LevelFilter;

use diskplan_api::constants::INVENTORY_PATH_DEFAULT;

use crate::DISKPLAN_VERSION;

#[derive(Parser, Debug)]
#[clap(version = DISKPLAN_VERSION)]
pub struct Cli {
    /// Logging verbosity [OFF, ERROR, WARN, INFO, DEBUG, TRACE]
    #[arg(global = true, short, long, default_value_t = LevelFilter::Info)]
    pub verbosity: LevelFilter,

    #[clap(subcommand)]
    pub command: Commands,
}

/// Formats the partition graph can be emitted in
#[derive(clap::ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a partition configuration into the provisioning API partition graph
    Compile {
        /// The partition configuration to compile
        #[clap(index = 1)]
        request: PathBuf,

        /// Server inventory with the local drives and installable operating systems
        #[clap(short, long, default_value = INVENTORY_PATH_DEFAULT)]
        inventory: PathBuf,

        /// Name of the operating system that will be installed
        #[clap(long)]
        os: String,

        /// Output format of the partition graph
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Path to save the partition graph, instead of printing it
        #[clap(short, long)]
        output: Option<PathBuf>,

        /// Use sequential node ids instead of random UUIDs
        #[clap(long)]
        sequential_ids: bool,

        /// Path to save an eventual fatal error
        #[clap(short, long)]
        error: Option<PathBuf>,
    },

    /// Show the partition plan after default and boot partitions were filled in
    Plan {
        /// The partition configuration to resolve
        #[clap(index = 1)]
        request: PathBuf,

        /// Server inventory with the local drives and installable operating systems
        #[clap(short, long, default_value = INVENTORY_PATH_DEFAULT)]
        inventory: PathBuf,

        /// Name of the operating system that will be installed
        #[clap(long)]
        os: String,
    },

    /// Validate a partition configuration without looking at the server
    Validate {
        /// The partition configuration to validate
        #[clap(index = 1)]
        request: PathBuf,
    },
}

impl Display for Commands {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Commands::Compile { .. } => "compile",
            Commands::Plan { .. } => "plan",
            Commands::Validate { .. } => "validate",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_compile() {
        let cli = Cli::parse_from([
            "diskplan",
            "compile",
            "request.yaml",
            "--os",
            "debian-12",
            "--format",
            "yaml",
            "--sequential-ids",
        ]);
        assert_eq!(cli.verbosity, LevelFilter::Info);
        match cli.command {
            Commands::Compile {
                request,
                inventory,
                os,
                format,
                output,
                sequential_ids,
                error,
            } => {
                assert_eq!(request, PathBuf::from("request.yaml"));
                assert_eq!(inventory, PathBuf::from(INVENTORY_PATH_DEFAULT));
                assert_eq!(os, "debian-12");
                assert_eq!(format, OutputFormat::Yaml);
                assert_eq!(output, None);
                assert!(sequential_ids);
                assert_eq!(error, None);
            }
            other => panic!("unexpected command {other}"),
        }
    }
}
