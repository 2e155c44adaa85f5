use super::HandlerContext;
use crate::presentation::sheet::Sources;
use crate::presentation::templates::{self, HISTOGRAM};
use crate::snapshot::{Snapshot, plain_cells};
use crate::types::OutputFormat;
use anyhow::{Result, bail};
use asadm_engine::{HistogramMode, HistogramOutput, create_histogram_output};
use std::collections::BTreeMap;

pub fn handle(
    ctx: &HandlerContext,
    snapshot: &Snapshot,
    name: &str,
    byte_distribution: bool,
    bucket_count: Option<usize>,
    logarithmic: bool,
) -> Result<()> {
    let Some(data) = snapshot.histogram(name, logarithmic) else {
        bail!("histogram {} is not in the snapshot", name);
    };

    let mode = if byte_distribution {
        HistogramMode::ByteDistribution {
            bucket_count: bucket_count.unwrap_or(ctx.config.histogram.bucket_count),
            builds: &snapshot.metadata.server_build,
        }
    } else {
        HistogramMode::Percentiles
    };

    let output = create_histogram_output(name, &data, mode)?;

    if ctx.format == OutputFormat::Json {
        return ctx.print_json(&output);
    }

    match output {
        HistogramOutput::Percentiles(by_namespace) => {
            for (namespace, nodes) in &by_namespace {
                let description = nodes.values().next().map(|hist| {
                    format!(
                        "Percentage of records having {} less than or equal to value measured in buckets of width {}",
                        name, hist.width
                    )
                });
                let sources: Sources = BTreeMap::from([(HISTOGRAM.to_string(), plain_cells(nodes)?)]);
                ctx.print_sheet(
                    templates::histogram_percentiles(),
                    &format!("{} - {} in Percentiles", namespace, name),
                    description,
                    &sources,
                )?;
            }
        }
        HistogramOutput::Distribution(by_namespace) => {
            for (namespace, distribution) in &by_namespace {
                let sources: Sources =
                    BTreeMap::from([(HISTOGRAM.to_string(), plain_cells(&distribution.nodes)?)]);
                ctx.print_sheet(
                    templates::histogram_distribution(&distribution.columns),
                    &format!("{} - {} Distribution in Bytes", namespace, name),
                    Some("Number of records per size range".to_string()),
                    &sources,
                )?;
            }
        }
    }

    Ok(())
}
