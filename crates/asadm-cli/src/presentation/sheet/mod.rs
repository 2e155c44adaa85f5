//! Sheet engine: declarative tables over per-node data.
//!
//! A sheet is declared once ([`SheetDecl`]), then [`build`] projects every
//! field out of the merged source records, filters, groups, orders,
//! aggregates and converts the result into a [`PreparedSheet`] that a
//! renderer lays out.

pub mod aggregator;
pub mod decl;
pub mod engine;
pub mod field;
pub mod projectors;

pub use aggregator::{Aggregator, Reduction};
pub use decl::{
    Align, EntryData, Field, FieldDecl, Hidden, ProjectedRecord, ProjectionError, SheetDecl,
    SourceRecord, Style,
};
pub use engine::{PreparedSheet, Sources, build};
pub use field::{Group, PreparedField, PreparedLeaf};
