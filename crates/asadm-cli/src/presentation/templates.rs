//! Sheet declarations for the listings the CLI prints.
//!
//! Source names used by these sheets:
//!
//! * `ns_stats`    - `node -> namespace -> merged stats and configs`
//! * `builds`      - `node -> build version`
//! * `stop_writes` - `node -> entry id -> stop-writes entry`
//! * `features`    - `node -> feature -> in use`
//! * `histogram`   - `node -> histogram output for one namespace`

use crate::presentation::sheet::projectors::{
    boolean, each_key, entry, first_of, number, number_at, percent, row_key, string,
};
use crate::presentation::sheet::{
    Aggregator, Align, EntryData, Field, FieldDecl, ProjectionError, SheetDecl, SourceRecord, Style,
};
use asadm_engine::size::byte_size;
use asadm_engine::FEATURE_CHECKS;
use asadm_types::{Scalar, ValueCell, attrs};
use serde_json::Value;

pub const NS_STATS: &str = "ns_stats";
pub const BUILDS: &str = "builds";
pub const STOP_WRITES: &str = "stop_writes";
pub const FEATURES: &str = "features";
pub const HISTOGRAM: &str = "histogram";

const PERCENTILE_TITLES: [&str; 10] = [
    "10%", "20%", "30%", "40%", "50%", "60%", "70%", "80%", "90%", "100%",
];

fn bytes(edata: &EntryData<'_>) -> String {
    match edata.value.as_i64() {
        Some(n) => byte_size(n),
        None => edata.value.to_string(),
    }
}

fn pct(edata: &EntryData<'_>) -> String {
    match edata.value.as_f64() {
        Some(v) => format!("{:.2} %", v),
        None => edata.value.to_string(),
    }
}

fn yes_no(edata: &EntryData<'_>) -> String {
    match edata.value {
        Scalar::Bool(true) => "YES".to_string(),
        Scalar::Bool(false) => "NO".to_string(),
        other => other.to_string(),
    }
}

fn at_least(edata: &EntryData<'_>, limit: f64) -> bool {
    edata.value.as_f64().is_some_and(|v| v >= limit)
}

fn below(edata: &EntryData<'_>, limit: f64) -> bool {
    edata.value.as_f64().is_some_and(|v| v < limit)
}

/// Per node and namespace usage. `namespace` limits the listing to one
/// namespace.
pub fn namespace_usage(namespace: Option<String>) -> SheetDecl {
    let memory_used = || number(NS_STATS, attrs::MEMORY_USED_BYTES.keys);
    let memory_size = || number(NS_STATS, attrs::MEMORY_SIZE.keys);

    let fields: Vec<Field> = vec![
        FieldDecl::new("Namespace", each_key(NS_STATS)).into(),
        FieldDecl::new("Node", row_key()).into(),
        FieldDecl::new("Build", entry(BUILDS)).into(),
        FieldDecl::new("Storage Engine", string(NS_STATS, attrs::STORAGE_ENGINE.keys)).into(),
        FieldDecl::new("Repl Factor", number(NS_STATS, attrs::EFFECTIVE_REPL_FACTOR.keys))
            .align(Align::Right)
            .into(),
        FieldDecl::new("Master Objects", number(NS_STATS, attrs::MASTER_OBJECTS.keys))
            .aggregator(Aggregator::sum())
            .align(Align::Right)
            .into(),
        FieldDecl::new("Memory Used", memory_used())
            .converter(bytes)
            .aggregator(Aggregator::sum())
            .align(Align::Right)
            .into(),
        FieldDecl::new("Memory Total", memory_size())
            .converter(bytes)
            .aggregator(Aggregator::sum())
            .align(Align::Right)
            .into(),
        FieldDecl::new("Memory Used%", percent(memory_used(), memory_size()))
            .converter(pct)
            .aggregator(Aggregator::max())
            .formatter(Style::Alert, |e| at_least(e, 90.0))
            .formatter(Style::Warning, |e| at_least(e, 70.0))
            .align(Align::Right)
            .into(),
        FieldDecl::new(
            "Disk Used",
            first_of(vec![
                Box::new(number(NS_STATS, attrs::DEVICE_USED_BYTES.keys)),
                Box::new(number(NS_STATS, attrs::PMEM_USED_BYTES.keys)),
            ]),
        )
        .converter(bytes)
        .aggregator(Aggregator::sum())
        .align(Align::Right)
        .into(),
        FieldDecl::new(
            "Disk Total",
            first_of(vec![
                Box::new(number(NS_STATS, attrs::DEVICE_TOTAL_BYTES.keys)),
                Box::new(number(NS_STATS, attrs::PMEM_TOTAL_BYTES.keys)),
            ]),
        )
        .converter(bytes)
        .aggregator(Aggregator::sum())
        .align(Align::Right)
        .into(),
        FieldDecl::new(
            "Disk Avail%",
            first_of(vec![
                Box::new(number(NS_STATS, attrs::DEVICE_AVAIL_PCT.keys)),
                Box::new(number(NS_STATS, attrs::PMEM_AVAIL_PCT.keys)),
            ]),
        )
        .aggregator(Aggregator::min())
        .formatter(Style::Alert, |e| below(e, 10.0))
        .formatter(Style::Warning, |e| below(e, 20.0))
        .align(Align::Right)
        .into(),
        FieldDecl::new(
            "Pending Migrates",
            number(NS_STATS, attrs::MIGRATE_TX_REMAINING.keys),
        )
        .aggregator(Aggregator::sum())
        .formatter(Style::Warning, |e| at_least(e, 1.0))
        .align(Align::Right)
        .into(),
    ];

    let decl = SheetDecl::new(fields)
        .for_each(NS_STATS)
        .order_by(&["Namespace", "Node"])
        .title_fields(&["Namespace", "Node"]);

    match namespace {
        Some(ns) => decl.where_fn(move |record| {
            matches!(record.cell("Namespace"), ValueCell::Value(Scalar::Str(name)) if *name == ns)
        }),
        None => decl,
    }
}

/// Every evaluated stop-writes metric, per node.
pub fn stop_writes() -> SheetDecl {
    SheetDecl::new(vec![
        FieldDecl::new("Namespace", string(STOP_WRITES, &["namespace"])).into(),
        FieldDecl::new("Set", string(STOP_WRITES, &["set"])).into(),
        FieldDecl::new("Node", row_key()).into(),
        FieldDecl::new("Metric", string(STOP_WRITES, &["metric"])).into(),
        FieldDecl::new("Usage", number(STOP_WRITES, &["metric_usage"]))
            .align(Align::Right)
            .into(),
        FieldDecl::new("Threshold", number(STOP_WRITES, &["metric_threshold"]))
            .align(Align::Right)
            .into(),
        FieldDecl::new("Config", string(STOP_WRITES, &["config"])).into(),
        FieldDecl::new("Stop Writes", boolean(STOP_WRITES, &["stop_writes"]))
            .converter(yes_no)
            .formatter(Style::Alert, |e| matches!(e.value, Scalar::Bool(true)))
            .into(),
    ])
    .for_each(STOP_WRITES)
    .order_by(&["Namespace", "Set", "Node", "Metric"])
    .title_fields(&["Node", "Metric"])
}

/// One line per registered feature, one column per node.
pub fn features() -> SheetDecl {
    let mut fields: Vec<Field> = vec![FieldDecl::new("Node", row_key()).into()];

    for check in FEATURE_CHECKS {
        fields.push(
            FieldDecl::new(check.name, boolean(FEATURES, std::slice::from_ref(&check.name)))
                .converter(yes_no)
                .formatter(Style::Bold, |e| matches!(e.value, Scalar::Bool(true)))
                .into(),
        );
    }

    SheetDecl::new(fields).title_fields(&["Node"])
}

fn percentile_at(index: usize) -> impl Fn(&SourceRecord) -> Result<Scalar, ProjectionError> + Send + Sync {
    move |record| match record.get(HISTOGRAM) {
        ValueCell::Value(hist) => hist
            .get("percentiles")
            .and_then(|p| p.get(index))
            .and_then(Value::as_i64)
            .map(Scalar::Int)
            .ok_or(ProjectionError::NoEntry),
        ValueCell::Absent => Err(ProjectionError::NoEntry),
        ValueCell::Error(cause) => Err(ProjectionError::Fault(cause)),
    }
}

/// Decile boundaries of one namespace's histogram, per node.
pub fn histogram_percentiles() -> SheetDecl {
    let mut fields: Vec<Field> = vec![FieldDecl::new("Node", row_key()).into()];

    for (index, title) in PERCENTILE_TITLES.iter().enumerate() {
        fields.push(
            FieldDecl::new(*title, percentile_at(index))
                .align(Align::Right)
                .into(),
        );
    }

    SheetDecl::new(fields).title_fields(&["Node"])
}

/// Object counts per byte range of one namespace, per node. `columns` are
/// the ranges to show, in order.
pub fn histogram_distribution(columns: &[String]) -> SheetDecl {
    let mut fields: Vec<Field> = vec![FieldDecl::new("Node", row_key()).into()];

    for column in columns {
        let key = column.clone();
        fields.push(
            FieldDecl::new(column.clone(), move |record: &SourceRecord| {
                number_at(record, HISTOGRAM, &[key.as_str()])
            })
            .aggregator(Aggregator::sum())
            .align(Align::Right)
            .into(),
        );
    }

    SheetDecl::new(fields).title_fields(&["Node"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::sheet::{PreparedField, Sources, build};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn source(name: &str, rows: Value) -> Sources {
        let rows: BTreeMap<String, Value> = serde_json::from_value(rows).unwrap();
        BTreeMap::from([(
            name.to_string(),
            rows.into_iter().map(|(k, v)| (k, ValueCell::Value(v))).collect(),
        )])
    }

    fn converted(sheet: &crate::presentation::sheet::PreparedSheet<'_>, key: &str) -> Vec<String> {
        sheet
            .fields
            .iter()
            .find_map(|f| match f {
                PreparedField::Leaf(leaf) if leaf.decl.key == key => Some(leaf.converted[0].clone()),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_namespace_usage_filters_namespace() {
        let data = source(
            NS_STATS,
            json!({
                "n1": {
                    "test": {"memory_used_bytes": "512", "memory-size": "1024", "master_objects": "4"},
                    "bar": {"memory_used_bytes": "1", "memory-size": "2"},
                },
                "n2": {"test": {"memory_used_bytes": "256", "memory-size": "1024", "master_objects": "6"}},
            }),
        );

        let decl = namespace_usage(Some("test".to_string()));
        let sheet = build(&decl, "Namespace Usage", &data, &Value::Null);

        assert_eq!(sheet.n_records(), 2);
        assert_eq!(converted(&sheet, "Node"), vec!["n1", "n2"]);
        assert_eq!(converted(&sheet, "Memory Used"), vec!["512 B", "256 B"]);
        assert_eq!(converted(&sheet, "Memory Used%"), vec!["50.00 %", "25.00 %"]);

        let hidden: Vec<&str> = sheet
            .fields
            .iter()
            .filter(|f| f.is_hidden())
            .map(|f| f.key())
            .collect();
        assert!(hidden.contains(&"Disk Used"));
        assert!(hidden.contains(&"Build"));
    }

    #[test]
    fn test_features_sheet_has_one_field_per_feature() {
        let decl = features();
        assert_eq!(decl.fields.len(), FEATURE_CHECKS.len() + 1);

        let data = source(FEATURES, json!({"n1": {"KVS": true, "Scan": false}}));
        let sheet = build(&decl, "Features", &data, &Value::Null);
        assert_eq!(converted(&sheet, "KVS"), vec!["YES"]);
    }

    #[test]
    fn test_percentile_sheet_reads_each_decile() {
        let data = source(
            HISTOGRAM,
            json!({"n1": {"percentiles": [1, 2, 3, 4, 5, 6, 7, 8, 9, 10]}}),
        );
        let decl = histogram_percentiles();
        let sheet = build(&decl, "objsz", &data, &Value::Null);

        assert_eq!(converted(&sheet, "10%"), vec!["1"]);
        assert_eq!(converted(&sheet, "100%"), vec!["10"]);
    }

    #[test]
    fn test_integer_cells_survive_display_round_trip() {
        let decl = SheetDecl::new(vec![
            FieldDecl::new("Node", row_key()).into(),
            FieldDecl::new("Objects", number(NS_STATS, &["objects"])).into(),
        ]);
        let cells = |sheet: &crate::presentation::sheet::PreparedSheet<'_>| {
            sheet
                .fields
                .iter()
                .find_map(|f| match f {
                    PreparedField::Leaf(leaf) if leaf.decl.key == "Objects" => Some(leaf.groups[0].clone()),
                    _ => None,
                })
                .unwrap()
        };

        let data = source(
            NS_STATS,
            json!({
                "n1": {"objects": 42},
                "n2": {"objects": -7},
                "n3": {"objects": 9_007_199_254_740_993_i64},
            }),
        );
        let sheet = build(&decl, "Objects", &data, &Value::Null);
        let shown = converted(&sheet, "Objects");
        assert_eq!(shown, vec!["42", "-7", "9007199254740993"]);

        let reread: BTreeMap<String, Value> = converted(&sheet, "Node")
            .into_iter()
            .zip(&shown)
            .map(|(node, text)| (node, json!({"objects": text})))
            .collect();
        let reread = source(NS_STATS, serde_json::to_value(reread).unwrap());
        let again = build(&decl, "Objects", &reread, &Value::Null);

        assert_eq!(cells(&again), cells(&sheet));
        assert_eq!(
            cells(&sheet),
            vec![
                ValueCell::Value(Scalar::Int(42)),
                ValueCell::Value(Scalar::Int(-7)),
                ValueCell::Value(Scalar::Int(9_007_199_254_740_993)),
            ]
        );
    }
}
