use super::decl::{Field, Projected, ProjectedRecord, SheetDecl, SourceRecord};
use super::field::{Group, PreparedField};
use asadm_types::{Scalar, ValueCell};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// `source -> row key -> what that source reported for the row`
pub type Sources = BTreeMap<String, BTreeMap<String, ValueCell<Value>>>;

/// A sheet with every field projected, grouped, ordered, aggregated and
/// converted to display strings. Renderers only read it.
#[derive(Debug)]
pub struct PreparedSheet<'a> {
    pub decl: &'a SheetDecl,
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<PreparedField<'a>>,
    pub groups: Vec<Group>,
}

impl<'a> PreparedSheet<'a> {
    pub fn visible_fields(&self) -> impl Iterator<Item = &PreparedField<'a>> {
        self.fields.iter().filter(|f| !f.is_hidden())
    }

    pub fn n_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn n_records(&self) -> usize {
        self.groups.iter().map(|g| g.records.len()).sum()
    }

    /// Visible fields of every record, one object per record.
    pub fn records_json(&self) -> Value {
        let mut records = Vec::with_capacity(self.n_records());

        for (group_ix, group) in self.groups.iter().enumerate() {
            for entry_ix in 0..group.records.len() {
                let record = self
                    .visible_fields()
                    .map(|f| (f.key().to_string(), f.record_json(group_ix, entry_ix)))
                    .collect();
                records.push(Value::Object(record));
            }
        }

        Value::Array(records)
    }
}

/// Build a render-ready sheet.
///
/// `common` is handed to every converter and formatter untouched.
pub fn build<'a>(
    decl: &'a SheetDecl,
    title: impl Into<String>,
    sources: &Sources,
    common: &Value,
) -> PreparedSheet<'a> {
    let mut records = merge_sources(sources);

    for source in &decl.for_each {
        records = expand(records, source);
    }

    let mut projections: Vec<ProjectedRecord> = records
        .iter()
        .map(|record| project_fields(&decl.fields, record))
        .collect();

    if let Some(where_fn) = &decl.where_fn {
        projections.retain(|record| where_fn(record));
    }

    let mut groups = group_by_fields(projections, &decl.group_bys);
    order_by_fields(&mut groups, &decl.order_bys);

    let fields = decl
        .fields
        .iter()
        .map(|field| PreparedField::prepare(field, decl, &groups, &[], common))
        .collect();

    PreparedSheet {
        decl,
        title: title.into(),
        description: None,
        fields,
        groups,
    }
}

/// One record per row key seen in any source. Sources without the key
/// contribute an absent entry.
fn merge_sources(sources: &Sources) -> Vec<SourceRecord> {
    let row_keys: BTreeSet<&String> = sources.values().flat_map(|rows| rows.keys()).collect();

    row_keys
        .into_iter()
        .map(|row_key| {
            let mut record = SourceRecord::new(row_key.clone());
            for (source, rows) in sources {
                let cell = rows.get(row_key).cloned().unwrap_or(ValueCell::Absent);
                record.entries.insert(source.clone(), cell);
            }
            record
        })
        .collect()
}

/// Replace each record by one record per entry of the map `source`
/// reported. Entries that are not maps stay a single record; non-map
/// values become errors.
fn expand(records: Vec<SourceRecord>, source: &str) -> Vec<SourceRecord> {
    let mut expanded = Vec::with_capacity(records.len());

    for record in records {
        match record.entries.get(source) {
            Some(ValueCell::Value(Value::Object(map))) => {
                for (key, value) in map {
                    let mut sub = record.clone();
                    sub.entries
                        .insert(source.to_string(), ValueCell::Value(value.clone()));
                    sub.each.insert(source.to_string(), key.clone());
                    expanded.push(sub);
                }
            }
            Some(ValueCell::Value(_)) => {
                let mut sub = record.clone();
                sub.entries.insert(
                    source.to_string(),
                    ValueCell::error(format!("{} cannot be expanded", source)),
                );
                expanded.push(sub);
            }
            _ => expanded.push(record),
        }
    }

    expanded
}

fn project_fields(fields: &[Field], record: &SourceRecord) -> ProjectedRecord {
    let fields = fields
        .iter()
        .map(|field| {
            let projected = match field {
                Field::Leaf(decl) => Projected::Cell(decl.project(record)),
                Field::Tuple { fields, .. } => Projected::Tuple(project_fields(fields, record)),
            };
            (field.key().to_string(), projected)
        })
        .collect();

    ProjectedRecord { fields }
}

/// Sort then split into runs of equal keys, one group-by key at a time;
/// the first key is the outermost partition.
fn group_by_fields(projections: Vec<ProjectedRecord>, group_bys: &[String]) -> Vec<Group> {
    let mut grouping = vec![Group {
        key: Vec::new(),
        records: projections,
    }];

    for group_by in group_bys {
        let mut next: Vec<Group> = Vec::new();

        for mut parent in grouping {
            parent
                .records
                .sort_by(|a, b| a.cell(group_by).cmp(&b.cell(group_by)));

            let start = next.len();
            for record in parent.records {
                let value = record.cell(group_by).map(|v| v.clone());
                match next[start..].last_mut() {
                    Some(group) if group.key.last() == Some(&value) => group.records.push(record),
                    _ => next.push(child_group(&parent.key, value, record)),
                }
            }
        }

        grouping = next;
    }

    grouping
}

fn child_group(
    parent: &[ValueCell<Scalar>],
    key: ValueCell<Scalar>,
    first: ProjectedRecord,
) -> Group {
    let mut full_key = parent.to_vec();
    full_key.push(key);
    Group {
        key: full_key,
        records: vec![first],
    }
}

/// Stable sorts from the last order-by key to the first, so the first key
/// is the most significant.
fn order_by_fields(groups: &mut [Group], order_bys: &[String]) {
    for group in groups {
        for order_by in order_bys.iter().rev() {
            group
                .records
                .sort_by(|a, b| a.cell(order_by).cmp(&b.cell(order_by)));
        }
    }
}
