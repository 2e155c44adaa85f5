//! Declarative sheet descriptions.
//!
//! A [`SheetDecl`] says which columns exist and how each one is pulled out of
//! a [`SourceRecord`]; the engine in [`super::engine`] does the rest.

use super::aggregator::Aggregator;
use asadm_types::{Scalar, ValueCell};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Why a projector produced no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    /// The record legitimately has nothing for this field.
    NoEntry,
    /// The source faulted or reported something unusable.
    Fault(String),
}

impl fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionError::NoEntry => write!(f, "no entry"),
            ProjectionError::Fault(cause) => write!(f, "{}", cause),
        }
    }
}

impl std::error::Error for ProjectionError {}

/// One merged row: what each source reported for the same row key.
///
/// After for-each expansion a source is bound to one entry of the sub-map it
/// reported; [`SourceRecord::each_key`] names that entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRecord {
    pub(crate) row_key: String,
    pub(crate) entries: BTreeMap<String, ValueCell<Value>>,
    pub(crate) each: BTreeMap<String, String>,
}

impl SourceRecord {
    pub fn new(row_key: impl Into<String>) -> Self {
        Self {
            row_key: row_key.into(),
            ..Self::default()
        }
    }

    pub fn with(mut self, source: impl Into<String>, cell: ValueCell<Value>) -> Self {
        self.entries.insert(source.into(), cell);
        self
    }

    pub fn row_key(&self) -> &str {
        &self.row_key
    }

    /// The entry a source reported for this row. Unknown sources are absent.
    pub fn get(&self, source: &str) -> ValueCell<&Value> {
        match self.entries.get(source) {
            Some(cell) => cell.as_ref(),
            None => ValueCell::Absent,
        }
    }

    /// Key of the sub-entry a for-each source is bound to.
    pub fn each_key(&self, source: &str) -> Option<&str> {
        self.each.get(source).map(String::as_str)
    }
}

pub type ProjectFn = dyn Fn(&SourceRecord) -> Result<Scalar, ProjectionError> + Send + Sync;
pub type ConvertFn = dyn Fn(&EntryData<'_>) -> String + Send + Sync;
pub type FormatFn = dyn Fn(&EntryData<'_>) -> bool + Send + Sync;
pub type WhereFn = dyn Fn(&ProjectedRecord) -> bool + Send + Sync;

/// Everything a converter or formatter may look at for one cell.
#[derive(Debug, Clone, Copy)]
pub struct EntryData<'a> {
    pub value: &'a Scalar,
    /// Every entry of the cell's group, in display order.
    pub values: &'a [ValueCell<Scalar>],
    /// The projected record the cell belongs to. `None` for aggregates.
    pub record: Option<&'a ProjectedRecord>,
    pub common: &'a Value,
}

impl<'a> EntryData<'a> {
    pub fn value(value: &'a Scalar, common: &'a Value) -> Self {
        Self {
            value,
            values: &[],
            record: None,
            common,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Right,
    Center,
}

/// Whether a field is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Hidden {
    /// Hidden when every projected value is absent.
    #[default]
    Auto,
    Always,
    Never,
}

/// Highlight applied to a cell whose formatter matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Alert,
    Warning,
    Bold,
}

pub struct Formatter {
    pub style: Style,
    pub applies: Box<FormatFn>,
}

pub struct FieldDecl {
    pub key: String,
    pub title: String,
    pub projector: Box<ProjectFn>,
    pub converter: Box<ConvertFn>,
    pub aggregator: Option<Aggregator>,
    pub hidden: Hidden,
    pub formatters: Vec<Formatter>,
    pub align: Align,
}

impl FieldDecl {
    /// A field keyed by its title, converted with `Display`.
    pub fn new<P>(title: impl Into<String>, projector: P) -> Self
    where
        P: Fn(&SourceRecord) -> Result<Scalar, ProjectionError> + Send + Sync + 'static,
    {
        let title = title.into();
        Self {
            key: title.clone(),
            title,
            projector: Box::new(projector),
            converter: Box::new(|edata| edata.value.to_string()),
            aggregator: None,
            hidden: Hidden::Auto,
            formatters: Vec::new(),
            align: Align::Left,
        }
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn converter<C>(mut self, converter: C) -> Self
    where
        C: Fn(&EntryData<'_>) -> String + Send + Sync + 'static,
    {
        self.converter = Box::new(converter);
        self
    }

    pub fn aggregator(mut self, aggregator: Aggregator) -> Self {
        self.aggregator = Some(aggregator);
        self
    }

    pub fn hidden(mut self, hidden: Hidden) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Formatters are tried in the order added; the first match wins.
    pub fn formatter<F>(mut self, style: Style, applies: F) -> Self
    where
        F: Fn(&EntryData<'_>) -> bool + Send + Sync + 'static,
    {
        self.formatters.push(Formatter {
            style,
            applies: Box::new(applies),
        });
        self
    }

    pub fn project(&self, record: &SourceRecord) -> ValueCell<Scalar> {
        match (self.projector)(record) {
            Ok(value) => ValueCell::Value(value),
            Err(ProjectionError::NoEntry) => ValueCell::Absent,
            Err(ProjectionError::Fault(cause)) => ValueCell::Error(cause),
        }
    }
}

impl fmt::Debug for FieldDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDecl")
            .field("key", &self.key)
            .field("title", &self.title)
            .field("hidden", &self.hidden)
            .field("align", &self.align)
            .finish_non_exhaustive()
    }
}

/// A column, or a titled bundle of columns addressed by `key`.
#[derive(Debug)]
pub enum Field {
    Leaf(FieldDecl),
    Tuple {
        key: String,
        title: String,
        fields: Vec<Field>,
    },
}

impl Field {
    pub fn key(&self) -> &str {
        match self {
            Field::Leaf(decl) => &decl.key,
            Field::Tuple { key, .. } => key,
        }
    }

    pub fn tuple(title: impl Into<String>, fields: Vec<Field>) -> Self {
        let title = title.into();
        Field::Tuple {
            key: title.clone(),
            title,
            fields,
        }
    }

    fn has_aggregate(&self) -> bool {
        match self {
            Field::Leaf(decl) => decl.aggregator.is_some(),
            Field::Tuple { fields, .. } => fields.iter().any(Field::has_aggregate),
        }
    }
}

impl From<FieldDecl> for Field {
    fn from(decl: FieldDecl) -> Self {
        Field::Leaf(decl)
    }
}

pub const DEFAULT_NO_ENTRY: &str = "--";
pub const DEFAULT_ERROR_ENTRY: &str = "~~";

pub struct SheetDecl {
    pub fields: Vec<Field>,
    /// Sources whose per-row sub-maps expand into one record per entry,
    /// applied in order.
    pub for_each: Vec<String>,
    pub where_fn: Option<Box<WhereFn>>,
    pub group_bys: Vec<String>,
    pub order_bys: Vec<String>,
    /// Fields repeated between blocks of rows in row-style output.
    pub title_fields: Vec<String>,
    pub no_entry: String,
    pub error_entry: String,
    pub separator: String,
}

impl SheetDecl {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            for_each: Vec::new(),
            where_fn: None,
            group_bys: Vec::new(),
            order_bys: Vec::new(),
            title_fields: Vec::new(),
            no_entry: DEFAULT_NO_ENTRY.to_string(),
            error_entry: DEFAULT_ERROR_ENTRY.to_string(),
            separator: "|".to_string(),
        }
    }

    pub fn for_each(mut self, source: impl Into<String>) -> Self {
        self.for_each.push(source.into());
        self
    }

    pub fn where_fn<W>(mut self, predicate: W) -> Self
    where
        W: Fn(&ProjectedRecord) -> bool + Send + Sync + 'static,
    {
        self.where_fn = Some(Box::new(predicate));
        self
    }

    pub fn group_by(mut self, keys: &[&str]) -> Self {
        self.group_bys = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn order_by(mut self, keys: &[&str]) -> Self {
        self.order_bys = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn title_fields(mut self, keys: &[&str]) -> Self {
        self.title_fields = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn placeholders(mut self, no_entry: &str, error_entry: &str) -> Self {
        self.no_entry = no_entry.to_string();
        self.error_entry = error_entry.to_string();
        self
    }

    pub fn has_aggregates(&self) -> bool {
        self.fields.iter().any(Field::has_aggregate)
    }
}

impl fmt::Debug for SheetDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetDecl")
            .field("fields", &self.fields)
            .field("for_each", &self.for_each)
            .field("group_bys", &self.group_bys)
            .field("order_bys", &self.order_bys)
            .finish_non_exhaustive()
    }
}

/// A value projected for one field of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projected {
    Cell(ValueCell<Scalar>),
    Tuple(ProjectedRecord),
}

/// Projected fields of one record, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectedRecord {
    pub(crate) fields: Vec<(String, Projected)>,
}

impl ProjectedRecord {
    pub fn get(&self, key: &str) -> Option<&Projected> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// The top-level cell under `key`; tuples and unknown keys are absent.
    pub fn cell(&self, key: &str) -> ValueCell<&Scalar> {
        match self.get(key) {
            Some(Projected::Cell(cell)) => cell.as_ref(),
            _ => ValueCell::Absent,
        }
    }

    pub(crate) fn cell_at(&self, path: &[&str]) -> ValueCell<Scalar> {
        match path {
            [] => ValueCell::Absent,
            [key] => self.cell(key).map(|v| v.clone()),
            [key, rest @ ..] => match self.get(key) {
                Some(Projected::Tuple(inner)) => inner.cell_at(rest),
                _ => ValueCell::Absent,
            },
        }
    }
}
