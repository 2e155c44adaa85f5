use crate::types::{ColorChoice, LogLevel, OutputFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "asadm")]
#[command(about = "Offline Aerospike cluster reports from a captured snapshot", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Cluster snapshot (JSON) to report on
    #[arg(long, short = 's', global = true, env = "ASADM_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, default_value = "plain", global = true)]
    pub format: OutputFormat,

    #[arg(long, default_value = "info", global = true)]
    pub log_level: LogLevel,

    /// Overrides the configured color choice
    #[arg(long, global = true)]
    pub color: Option<ColorChoice>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Cluster and per-namespace summary
    Summary {
        /// Count agent license entries reported while the cluster was unstable
        #[arg(long)]
        allow_unstable: bool,
    },

    /// Feature usage per node
    Features,

    /// Metrics that cause, or may cause, stop-writes
    StopWrites {
        /// Only list metrics that currently trigger stop-writes
        #[arg(long)]
        triggered: bool,
    },

    /// Per namespace histogram, as percentiles or byte distribution
    Histogram {
        /// Histogram name, e.g. `objsz`, `ttl` or `object-size`
        name: String,

        #[arg(long)]
        byte_distribution: bool,

        #[arg(long)]
        bucket_count: Option<usize>,

        /// The histogram is logarithmic (`[lo-hi)=count` ranges)
        #[arg(long)]
        logarithmic: bool,
    },

    /// Memory and disk usage per namespace and node
    Namespaces {
        #[arg(long, short = 'n')]
        namespace: Option<String>,
    },

    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Write the default configuration file
    Init {
        #[arg(long)]
        force: bool,
    },
}
