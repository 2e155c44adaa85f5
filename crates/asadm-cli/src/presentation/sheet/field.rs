use super::decl::{EntryData, Field, FieldDecl, Hidden, ProjectedRecord, SheetDecl, Style};
use asadm_types::{Scalar, ValueCell};
use serde_json::Value;

/// Records of one group, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: Vec<ValueCell<Scalar>>,
    pub records: Vec<ProjectedRecord>,
}

/// A leaf field bound to the grouped data it displays.
///
/// `groups`, `converted`, `aggregates` and `aggregates_converted` all hold
/// one entry per group.
#[derive(Debug)]
pub struct PreparedLeaf<'a> {
    pub decl: &'a FieldDecl,
    pub hidden: bool,
    pub is_grouped_by: bool,
    pub is_ordered_by: bool,
    pub groups: Vec<Vec<ValueCell<Scalar>>>,
    pub converted: Vec<Vec<String>>,
    pub styles: Vec<Vec<Option<Style>>>,
    pub aggregates: Vec<Option<ValueCell<Scalar>>>,
    pub aggregates_converted: Vec<String>,
}

#[derive(Debug)]
pub enum PreparedField<'a> {
    Leaf(PreparedLeaf<'a>),
    Tuple {
        key: &'a str,
        title: &'a str,
        hidden: bool,
        fields: Vec<PreparedField<'a>>,
    },
}

impl<'a> PreparedField<'a> {
    pub(super) fn prepare(
        field: &'a Field,
        sheet: &'a SheetDecl,
        groups: &[Group],
        path: &[&'a str],
        common: &Value,
    ) -> Self {
        match field {
            Field::Leaf(decl) => {
                let mut path = path.to_vec();
                path.push(&decl.key);
                PreparedField::Leaf(PreparedLeaf::prepare(decl, sheet, groups, &path, common))
            }
            Field::Tuple { key, title, fields } => {
                let mut path = path.to_vec();
                path.push(key);
                let fields: Vec<_> = fields
                    .iter()
                    .map(|child| PreparedField::prepare(child, sheet, groups, &path, common))
                    .collect();
                PreparedField::Tuple {
                    key,
                    title,
                    hidden: fields.iter().all(PreparedField::is_hidden),
                    fields,
                }
            }
        }
    }

    pub fn key(&self) -> &str {
        match self {
            PreparedField::Leaf(leaf) => &leaf.decl.key,
            PreparedField::Tuple { key, .. } => key,
        }
    }

    pub fn is_hidden(&self) -> bool {
        match self {
            PreparedField::Leaf(leaf) => leaf.hidden,
            PreparedField::Tuple { hidden, .. } => *hidden,
        }
    }

    pub fn has_aggregate(&self) -> bool {
        match self {
            PreparedField::Leaf(leaf) => leaf.has_aggregate(),
            PreparedField::Tuple { fields, .. } => fields
                .iter()
                .filter(|f| !f.is_hidden())
                .any(PreparedField::has_aggregate),
        }
    }

    pub(super) fn record_json(&self, group_ix: usize, entry_ix: usize) -> Value {
        match self {
            PreparedField::Leaf(leaf) => {
                serde_json::to_value(&leaf.groups[group_ix][entry_ix]).unwrap_or(Value::Null)
            }
            PreparedField::Tuple { fields, .. } => Value::Object(
                fields
                    .iter()
                    .filter(|f| !f.is_hidden())
                    .map(|f| (f.key().to_string(), f.record_json(group_ix, entry_ix)))
                    .collect(),
            ),
        }
    }
}

impl<'a> PreparedLeaf<'a> {
    fn prepare(
        decl: &'a FieldDecl,
        sheet: &'a SheetDecl,
        groups: &[Group],
        path: &[&str],
        common: &Value,
    ) -> Self {
        let values: Vec<Vec<ValueCell<Scalar>>> = groups
            .iter()
            .map(|group| group.records.iter().map(|r| r.cell_at(path)).collect())
            .collect();

        let hidden = match decl.hidden {
            Hidden::Auto => values.iter().flatten().all(ValueCell::is_absent),
            Hidden::Always => true,
            Hidden::Never => false,
        };

        let mut leaf = Self {
            decl,
            hidden,
            is_grouped_by: sheet.group_bys.iter().any(|k| *k == decl.key),
            is_ordered_by: sheet.order_bys.iter().any(|k| *k == decl.key),
            groups: values,
            converted: Vec::new(),
            styles: Vec::new(),
            aggregates: Vec::new(),
            aggregates_converted: Vec::new(),
        };

        leaf.aggregate(sheet.has_aggregates());
        if !leaf.hidden {
            leaf.convert(sheet, groups, common);
        }
        leaf
    }

    pub fn has_aggregate(&self) -> bool {
        self.decl.aggregator.is_some()
    }

    pub fn title(&self) -> &str {
        &self.decl.title
    }

    pub fn n_entries(&self, group_ix: usize) -> usize {
        self.groups.get(group_ix).map_or(0, Vec::len)
    }

    fn aggregate(&mut self, sheet_has_aggregates: bool) {
        self.aggregates = self
            .groups
            .iter()
            .map(|group| {
                if self.hidden {
                    return None;
                }
                match &self.decl.aggregator {
                    Some(aggregator) => Some(aggregator.aggregate(group)),
                    // A grouped field shows its group value on the aggregate line.
                    None if self.is_grouped_by && sheet_has_aggregates => {
                        Some(group.first().cloned().unwrap_or(ValueCell::Absent))
                    }
                    None => None,
                }
            })
            .collect();
    }

    fn convert(&mut self, sheet: &SheetDecl, groups: &[Group], common: &Value) {
        let decl = self.decl;

        for (values, group) in self.groups.iter().zip(groups) {
            let mut converted = Vec::with_capacity(values.len());
            let mut styles = Vec::with_capacity(values.len());

            for (cell, record) in values.iter().zip(&group.records) {
                match cell {
                    ValueCell::Value(value) => {
                        let edata = EntryData {
                            value,
                            values,
                            record: Some(record),
                            common,
                        };
                        converted.push((decl.converter)(&edata));
                        styles.push(
                            decl.formatters
                                .iter()
                                .find(|f| (f.applies)(&edata))
                                .map(|f| f.style),
                        );
                    }
                    ValueCell::Absent => {
                        converted.push(sheet.no_entry.clone());
                        styles.push(None);
                    }
                    ValueCell::Error(_) => {
                        converted.push(sheet.error_entry.clone());
                        styles.push(None);
                    }
                }
            }

            self.converted.push(converted);
            self.styles.push(styles);
        }

        self.aggregates_converted = self
            .aggregates
            .iter()
            .map(|aggregate| match aggregate {
                None => String::new(),
                Some(ValueCell::Absent) => sheet.no_entry.clone(),
                Some(ValueCell::Error(_)) => sheet.error_entry.clone(),
                Some(ValueCell::Value(value)) => {
                    let edata = EntryData::value(value, common);
                    match decl.aggregator.as_ref().and_then(|a| a.converter.as_ref()) {
                        Some(converter) => converter(&edata),
                        None => (decl.converter)(&edata),
                    }
                }
            })
            .collect();
    }
}
