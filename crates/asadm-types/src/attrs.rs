//! Typed lookup of node attributes.
//!
//! Server releases have renamed many stats and configs over the years. Each
//! logical attribute is declared once here with its spellings in lookup
//! order; the first spelling present in a node's map wins, even when its
//! value turns out to be unusable.

use crate::{Fetched, Keyed, Stats};
use serde_json::Value;
use std::collections::BTreeMap;

/// Conversion from a raw reported value.
pub trait FromRaw: Sized {
    fn from_raw(value: &Value) -> Option<Self>;
}

impl FromRaw for i64 {
    fn from_raw(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }
}

impl FromRaw for f64 {
    fn from_raw(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

impl FromRaw for bool {
    fn from_raw(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
            Value::String(s) => Some(!s.is_empty()),
            Value::Number(n) => n.as_f64().map(|f| f != 0.0),
            _ => None,
        }
    }
}

impl FromRaw for String {
    fn from_raw(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// A logical attribute and its historical key spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attr {
    pub name: &'static str,
    pub keys: &'static [&'static str],
}

impl Attr {
    pub const fn new(name: &'static str, keys: &'static [&'static str]) -> Self {
        Self { name, keys }
    }

    /// The raw value under the first spelling present. A present-but-null
    /// value stops the search.
    pub fn raw<'a>(&self, stats: &'a Stats) -> Option<&'a Value> {
        let key = self.keys.iter().find(|k| stats.contains_key(**k))?;
        match stats.get(*key) {
            Some(Value::Null) | None => None,
            Some(v) => Some(v),
        }
    }

    pub fn get<V: FromRaw>(&self, stats: &Stats) -> Option<V> {
        self.raw(stats).and_then(V::from_raw)
    }

    pub fn get_or<V: FromRaw>(&self, stats: &Stats, default: V) -> V {
        self.get(stats).unwrap_or(default)
    }

    /// Read this attribute from every node (or namespace) that returned a
    /// non-empty map. Failed and empty entries are skipped; nodes without a
    /// usable value get `default`.
    pub fn collect<V: FromRaw + Clone>(&self, data: &Keyed<Stats>, default: V) -> BTreeMap<String, V> {
        usable(data)
            .map(|(key, stats)| (key.clone(), self.get_or(stats, default.clone())))
            .collect()
    }

    /// Like [`Attr::collect`] but leaves missing values as `None`.
    pub fn collect_opt<V: FromRaw>(&self, data: &Keyed<Stats>) -> BTreeMap<String, Option<V>> {
        usable(data)
            .map(|(key, stats)| (key.clone(), self.get(stats)))
            .collect()
    }
}

/// Entries that fetched successfully and carry at least one attribute.
pub fn usable(data: &Keyed<Stats>) -> impl Iterator<Item = (&String, &Stats)> {
    data.iter().filter_map(|(key, fetched)| match fetched {
        Fetched::Data(stats) if !stats.is_empty() => Some((key, stats)),
        _ => None,
    })
}

/// Sum two per-node maps, adding values under the same key.
pub fn add_maps<V>(into: &mut BTreeMap<String, V>, other: &BTreeMap<String, V>)
where
    V: Copy + std::ops::AddAssign,
{
    for (key, value) in other {
        match into.get_mut(key) {
            Some(existing) => *existing += *value,
            None => {
                into.insert(key.clone(), *value);
            }
        }
    }
}

/// Convert per-node percentages of per-node totals into absolute values.
/// Nodes missing from `pcts` are dropped.
pub fn pct_to_value(totals: &BTreeMap<String, i64>, pcts: &BTreeMap<String, i64>) -> BTreeMap<String, f64> {
    totals
        .iter()
        .filter_map(|(key, total)| {
            let pct = pcts.get(key)?;
            Some((key.clone(), (*total as f64 / 100.0) * *pct as f64))
        })
        .collect()
}

// Replication and object counts.
pub const EFFECTIVE_REPL_FACTOR: Attr = Attr::new(
    "effective replication factor",
    &["effective_replication_factor", "replication-factor", "repl-factor"],
);
pub const CONFIGURED_REPL_FACTOR: Attr =
    Attr::new("configured replication factor", &["repl-factor", "replication-factor"]);
pub const MASTER_OBJECTS: Attr = Attr::new("master objects", &["master_objects", "master-objects"]);
pub const MIGRATE_TX_REMAINING: Attr = Attr::new(
    "outgoing migrations remaining",
    &["migrate_tx_partitions_remaining", "migrate-tx-partitions-remaining"],
);

// Storage engine.
pub const STORAGE_ENGINE: Attr = Attr::new("storage engine", &["storage-engine"]);
pub const DEVICE_TOTAL_BYTES: Attr =
    Attr::new("device total bytes", &["device_total_bytes", "total-bytes-disk"]);
pub const DEVICE_USED_BYTES: Attr =
    Attr::new("device used bytes", &["device_used_bytes", "used-bytes-disk"]);
/// Current spelling only; used where older servers must not contribute.
pub const DEVICE_USED_BYTES_CURRENT: Attr = Attr::new("device used bytes", &["device_used_bytes"]);
pub const DEVICE_AVAIL_PCT: Attr =
    Attr::new("device available percent", &["device_available_pct", "available_pct"]);
pub const DEVICE_COMPRESSION_RATIO: Attr =
    Attr::new("device compression ratio", &["device_compression_ratio"]);
pub const PMEM_TOTAL_BYTES: Attr = Attr::new("pmem total bytes", &["pmem_total_bytes"]);
pub const PMEM_USED_BYTES: Attr = Attr::new("pmem used bytes", &["pmem_used_bytes"]);
pub const PMEM_AVAIL_PCT: Attr = Attr::new("pmem available percent", &["pmem_available_pct"]);
pub const PMEM_COMPRESSION_RATIO: Attr =
    Attr::new("pmem compression ratio", &["pmem_compression_ratio"]);
pub const COMPRESSION_RATIO: Attr = Attr::new(
    "compression ratio",
    &["device_compression_ratio", "pmem_compression_ratio"],
);
pub const DATA_IN_MEMORY: Attr = Attr::new(
    "data in memory",
    &["storage-engine.data-in-memory", "data-in-memory"],
);
pub const CACHE_READ_PCT: Attr = Attr::new("cache read percent", &["cache_read_pct", "cache-read-pct"]);

// Memory.
pub const MEMORY_SIZE: Attr = Attr::new("memory size", &["memory-size"]);
pub const MEMORY_USED_BYTES: Attr = Attr::new("memory used bytes", &["memory_used_bytes"]);
pub const MEMORY_USED_INDEX_BYTES: Attr =
    Attr::new("memory used index bytes", &["memory_used_index_bytes"]);
pub const MEMORY_USED_DATA_BYTES: Attr =
    Attr::new("memory used data bytes", &["memory_used_data_bytes"]);

// Primary index placement.
pub const INDEX_TYPE: Attr = Attr::new("index type", &["index-type"]);
pub const INDEX_MOUNTS_SIZE_LIMIT: Attr =
    Attr::new("index mounts size limit", &["index-type.mounts-size-limit"]);
pub const INDEX_PMEM_USED_BYTES: Attr = Attr::new("pmem index used bytes", &["index_pmem_used_bytes"]);
pub const INDEX_FLASH_USED_BYTES: Attr =
    Attr::new("flash index used bytes", &["index_flash_used_bytes"]);

// Cluster shape.
pub const RACK_ID: Attr = Attr::new("rack id", &["rack-id"]);
pub const CLUSTER_SIZE: Attr = Attr::new("cluster size", &["cluster_size"]);
pub const OS_DESCRIPTION: Attr = Attr::new("os description", &["description"]);
