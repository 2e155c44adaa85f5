// Types layer - the shapes every other asadm crate agrees on.
// Raw per-node dictionaries arrive from the info client (or a captured
// snapshot) as `Fetched` maps; everything downstream reads them through
// `Attr` lookups and carries display data as `ValueCell`s.

pub mod attrs;
pub mod cell;
pub mod data;
pub mod error;
pub mod version;

pub use attrs::{Attr, FromRaw, add_maps, pct_to_value, usable};
pub use cell::{Scalar, ValueCell};
pub use data::{
    DeepMerge, Fetched, Keyed, NodeNamespaceStats, NodeSetStats, NodeStats, SourceError, Stats,
    deep_merged, flip_keys,
};
pub use error::{Error, Result};
pub use version::{Version, VersionRange};
