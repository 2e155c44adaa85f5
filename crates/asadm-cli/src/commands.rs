use super::args::{Cli, Commands};
use super::handlers::{self, HandlerContext};
use crate::config::{Config, resolve_config_path};
use crate::logging;
use crate::snapshot::Snapshot;
use anyhow::{Context, Result};
use std::path::Path;

fn load_snapshot(path: Option<&Path>) -> Result<Snapshot> {
    let path = path.context("no snapshot given; pass --snapshot <FILE> or set ASADM_SNAPSHOT")?;
    Snapshot::load(path)
}

pub fn run(cli: Cli) -> Result<()> {
    logging::init(cli.log_level);

    let config_path = resolve_config_path(cli.config.as_deref())?;
    let config = Config::load_from(&config_path)?;
    let ctx = HandlerContext::new(cli.format, config, cli.color);

    let Some(command) = cli.command else {
        show_guidance();
        return Ok(());
    };

    let snapshot = cli.snapshot.as_deref();

    match command {
        Commands::Summary { allow_unstable } => {
            handlers::summary::handle(&ctx, &load_snapshot(snapshot)?, allow_unstable)
        }
        Commands::Features => handlers::features::handle(&ctx, &load_snapshot(snapshot)?),
        Commands::StopWrites { triggered } => {
            handlers::stop_writes::handle(&ctx, &load_snapshot(snapshot)?, triggered)
        }
        Commands::Histogram {
            name,
            byte_distribution,
            bucket_count,
            logarithmic,
        } => handlers::histogram::handle(
            &ctx,
            &load_snapshot(snapshot)?,
            &name,
            byte_distribution,
            bucket_count,
            logarithmic,
        ),
        Commands::Namespaces { namespace } => {
            handlers::namespaces::handle(&ctx, &load_snapshot(snapshot)?, namespace)
        }
        Commands::Config { command } => handlers::config::handle(&ctx, &config_path, command),
    }
}

fn show_guidance() {
    println!("asadm - Offline Aerospike cluster reports\n");
    println!("Quick commands:");
    println!("  asadm -s snap.json summary            # Cluster and namespace summary");
    println!("  asadm -s snap.json features           # Feature usage per node");
    println!("  asadm -s snap.json stop-writes        # Stop-writes causes");
    println!("  asadm -s snap.json histogram objsz    # Object size percentiles");
    println!("  asadm -s snap.json namespaces         # Namespace usage");
    println!("  asadm config init                     # Write the default config\n");
    println!("For more commands:");
    println!("  asadm --help");
}
