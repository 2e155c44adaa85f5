use super::HandlerContext;
use crate::presentation::sheet::Sources;
use crate::presentation::templates::{self, BUILDS, NS_STATS};
use crate::snapshot::{Snapshot, node_cells, plain_cells};
use anyhow::Result;
use std::collections::BTreeMap;

pub fn handle(ctx: &HandlerContext, snapshot: &Snapshot, namespace: Option<String>) -> Result<()> {
    let sources: Sources = BTreeMap::from([
        (NS_STATS.to_string(), node_cells(&snapshot.stats.namespaces())?),
        (BUILDS.to_string(), plain_cells(&snapshot.metadata.server_build)?),
    ]);

    ctx.print_sheet(
        templates::namespace_usage(namespace),
        "Namespace Usage Information",
        None,
        &sources,
    )
}
