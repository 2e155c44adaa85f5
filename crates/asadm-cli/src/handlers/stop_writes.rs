use super::HandlerContext;
use crate::presentation::sheet::Sources;
use crate::presentation::templates::{self, STOP_WRITES};
use crate::snapshot::Snapshot;
use anyhow::Result;
use asadm_engine::create_stop_writes_summary;
use asadm_types::{Scalar, ValueCell};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub fn handle(ctx: &HandlerContext, snapshot: &Snapshot, triggered: bool) -> Result<()> {
    let summary = create_stop_writes_summary(&snapshot.stats);

    let mut rows = BTreeMap::new();
    for (node, node_summary) in &summary {
        let mut entries = Map::new();
        for (key, entry) in &node_summary.entries {
            let id = format!(
                "{}/{}/{}",
                key.namespace.as_deref().unwrap_or(""),
                key.set.as_deref().unwrap_or(""),
                key.metric
            );
            entries.insert(id, serde_json::to_value(entry)?);
        }
        rows.insert(node.clone(), ValueCell::Value(Value::Object(entries)));
    }

    let mut decl = templates::stop_writes();
    if triggered {
        decl = decl.where_fn(|record| {
            matches!(record.cell("Stop Writes"), ValueCell::Value(Scalar::Bool(true)))
        });
    }

    let sources: Sources = BTreeMap::from([(STOP_WRITES.to_string(), rows)]);
    ctx.print_sheet(decl, "Stop Writes", None, &sources)
}
