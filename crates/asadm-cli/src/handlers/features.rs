use super::HandlerContext;
use crate::presentation::sheet::Sources;
use crate::presentation::templates::{self, FEATURES};
use crate::snapshot::Snapshot;
use anyhow::Result;
use asadm_engine::find_nodewise_features;
use asadm_types::ValueCell;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub fn handle(ctx: &HandlerContext, snapshot: &Snapshot) -> Result<()> {
    let nodewise = find_nodewise_features(&snapshot.stats);

    let rows = nodewise
        .into_iter()
        .map(|(node, usage)| {
            let features: Map<String, Value> = usage
                .features
                .into_iter()
                .map(|f| (f.feature, Value::Bool(f.in_use)))
                .collect();
            (node, ValueCell::Value(Value::Object(features)))
        })
        .collect();

    let sources: Sources = BTreeMap::from([(FEATURES.to_string(), rows)]);
    ctx.print_sheet(templates::features(), "Features", None, &sources)
}
