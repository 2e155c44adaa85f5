//! Object counts per byte range.

use super::{NodeHistograms, RawHistogram};
use crate::gates::{DEFAULT_RBLOCK_SIZE_BYTES, rblock_size_bytes};
use crate::size::{byte_size, label_to_bytes};
use asadm_types::{Fetched, Version, flip_keys};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Ranges at or past this bucket are shown open-ended.
const LAST_BUCKET: i64 = 99;

/// Byte-range columns to display and each node's count per range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NamespaceDistribution {
    pub columns: Vec<String>,
    /// `node -> range -> count`. May carry ranges that were hidden because
    /// no node had anything in them.
    pub nodes: BTreeMap<String, BTreeMap<String, u64>>,
}

fn compact(size: &str) -> String {
    size.replace(' ', "")
}

fn range_key(start: &str, end: &str) -> String {
    format!("{} to {}", start, end)
}

/// Label for raw buckets `[current, next)` of `width` blocks of
/// `rblock_bytes` each.
pub fn bucket_range(current: i64, next: i64, width: i64, rblock_bytes: i64) -> String {
    let mut start = "0 B".to_string();

    if current > 0 {
        let previous_end = ((current * width) - 1) * rblock_bytes;
        let start_bytes = if previous_end < 1 { 0 } else { previous_end + 1 };
        start = byte_size(start_bytes);

        if current == LAST_BUCKET || next > LAST_BUCKET {
            return format!(">{}", compact(&start));
        }
    }

    let end = byte_size(((next * width) - 1) * rblock_bytes);
    range_key(&compact(&start), &compact(&end))
}

fn rblock_for(node: &str, builds: &BTreeMap<String, String>) -> i64 {
    builds
        .get(node)
        .map(|build| rblock_size_bytes(&Version::parse(build)))
        .unwrap_or(DEFAULT_RBLOCK_SIZE_BYTES)
}

/// Boundaries of the display buckets. Each populated raw bucket gets its
/// own range when they fit in `bucket_count`; otherwise the populated span
/// is cut into `bucket_count` ranges, the last ones one bucket wider when
/// the span does not divide evenly.
fn start_buckets(populated: &BTreeSet<i64>, bucket_count: usize) -> Vec<i64> {
    let count = bucket_count.max(1) as i64;

    if populated.len() as i64 <= count {
        return populated.iter().flat_map(|b| [*b, *b + 1]).collect();
    }

    let (Some(first), Some(last)) = (populated.first(), populated.last()) else {
        return Vec::new();
    };

    let size = last - first + 1;
    let mut width = size / count;
    let widen_from = count - (size % count);
    let mut start = *first;
    let mut starts = Vec::with_capacity(count as usize + 1);

    for index in 0..count {
        starts.push(start);
        if index == widen_from {
            width += 1;
        }
        start += width;
    }
    starts.push(start);

    starts
}

pub(super) fn bytewise(
    data: &NodeHistograms,
    bucket_count: usize,
    builds: &BTreeMap<String, String>,
) -> BTreeMap<String, NamespaceDistribution> {
    let mut output = BTreeMap::new();

    for (ns, nodes) in flip_keys(data) {
        let linear: Vec<(String, i64, Vec<u64>)> = nodes
            .into_iter()
            .filter_map(|(node, fetched)| match fetched {
                Fetched::Data(RawHistogram::Linear(h)) => Some((node, h.width, h.data)),
                _ => None,
            })
            .collect();

        let populated: BTreeSet<i64> = linear
            .iter()
            .flat_map(|(_, _, hist)| {
                hist.iter()
                    .enumerate()
                    .filter(|(_, count)| **count > 0)
                    .map(|(i, _)| i as i64)
            })
            .collect();

        let ns_rblock = linear
            .iter()
            .map(|(node, _, _)| rblock_for(node, builds))
            .max()
            .unwrap_or(DEFAULT_RBLOCK_SIZE_BYTES);
        let ns_width = linear.last().map(|(_, width, _)| *width).unwrap_or(1);

        let starts = start_buckets(&populated, bucket_count);
        let mut columns: Vec<String> = Vec::new();
        let mut shown: BTreeMap<String, bool> = BTreeMap::new();

        for pair in starts.windows(2) {
            let key = bucket_range(pair[0], pair[1], ns_width, ns_rblock);
            shown.insert(key.clone(), false);
            columns.push(key);
        }

        let mut distribution = NamespaceDistribution::default();

        for (node, width, hist) in &linear {
            let rblock = rblock_for(node, builds);
            let mut values: BTreeMap<String, u64> = BTreeMap::new();

            for pair in starts.windows(2) {
                let key = bucket_range(pair[0], pair[1], *width, rblock);
                if !columns.contains(&key) {
                    columns.push(key.clone());
                }

                let count: u64 = (pair[0]..pair[1])
                    .filter_map(|b| hist.get(b as usize))
                    .sum();
                let total = values.entry(key.clone()).or_insert(0);
                *total += count;

                if *total > 0 {
                    shown.insert(key, true);
                } else {
                    shown.entry(key).or_insert(false);
                }
            }

            distribution.nodes.insert(node.clone(), values);
        }

        distribution.columns = columns
            .into_iter()
            .filter(|c| shown.get(c).copied().unwrap_or(false))
            .collect();
        output.insert(ns, distribution);
    }

    output
}

fn range_start_bytes(key: &str) -> Option<u64> {
    key.split(" to ").next().and_then(label_to_bytes)
}

/// Logarithmic histograms are already ranged; align their columns across
/// nodes and order them by range start.
pub(super) fn restructure_log(data: &NodeHistograms) -> BTreeMap<String, NamespaceDistribution> {
    let mut output = BTreeMap::new();

    for (ns, nodes) in flip_keys(data) {
        let mut distribution = NamespaceDistribution::default();
        let mut columns: Vec<String> = Vec::new();

        for (node, fetched) in nodes {
            let Fetched::Data(RawHistogram::Log(hist)) = fetched else {
                continue;
            };

            let mut values = BTreeMap::new();
            for (range, count) in hist.data {
                let Some((start, end)) = range.split_once('-') else {
                    continue;
                };
                let key = range_key(start, end);
                if !columns.contains(&key) {
                    columns.push(key.clone());
                }
                values.insert(key, count);
            }
            distribution.nodes.insert(node, values);
        }

        for values in distribution.nodes.values_mut() {
            for column in &columns {
                values.entry(column.clone()).or_insert(0);
            }
        }

        columns.sort_by_key(|c| range_start_bytes(c).unwrap_or(u64::MAX));
        distribution.columns = columns;
        output.insert(ns, distribution);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::{LinearHistogram, LogHistogram};
    use asadm_types::Keyed;

    fn node_with(ns: &str, hist: RawHistogram) -> Fetched<Keyed<RawHistogram>> {
        Fetched::Data(BTreeMap::from([(ns.to_string(), Fetched::Data(hist))]))
    }

    fn linear(width: i64, data: Vec<u64>) -> RawHistogram {
        RawHistogram::Linear(LinearHistogram {
            histogram: "objsz".to_string(),
            width,
            data,
            units: None,
        })
    }

    #[test]
    fn test_bucket_range_labels() {
        assert_eq!(bucket_range(0, 1, 1, 128), "0B to 0B");
        assert_eq!(bucket_range(1, 2, 1, 128), "0B to 128B");
        assert_eq!(bucket_range(8, 9, 1, 128), "897B to 1KB");
        assert_eq!(bucket_range(2, 10, 8, 512), "7KB to 39KB");
        assert_eq!(bucket_range(99, 100, 1, 128), ">12KB");
        assert_eq!(bucket_range(50, 120, 1, 128), ">6KB");
    }

    #[test]
    fn test_few_populated_buckets_shown_individually() {
        let populated = BTreeSet::from([2, 5]);
        assert_eq!(start_buckets(&populated, 5), vec![2, 3, 5, 6]);
    }

    #[test]
    fn test_wide_span_split_evenly_with_tail_widened() {
        let populated: BTreeSet<i64> = (0..12).collect();
        // 12 buckets into 5: widths 2, 2, 2, 3, 3
        assert_eq!(start_buckets(&populated, 5), vec![0, 2, 4, 6, 9, 12]);

        let populated: BTreeSet<i64> = (0..10).collect();
        assert_eq!(start_buckets(&populated, 5), vec![0, 2, 4, 6, 8, 10]);
    }

    #[test]
    fn test_bytewise_hides_empty_gaps() {
        let data: NodeHistograms = BTreeMap::from([
            ("n1".to_string(), node_with("test", linear(1, vec![0, 0, 4, 0, 0, 1]))),
            ("n2".to_string(), node_with("test", linear(1, vec![0, 0, 1]))),
        ]);
        let builds = BTreeMap::from([
            ("n1".to_string(), "6.0.0".to_string()),
            ("n2".to_string(), "6.0.0".to_string()),
        ]);

        let output = bytewise(&data, 5, &builds);
        let test = &output["test"];

        assert_eq!(test.columns, vec!["129B to 256B".to_string(), "513B to 640B".to_string()]);
        assert_eq!(test.nodes["n1"]["129B to 256B"], 4);
        assert_eq!(test.nodes["n1"]["513B to 640B"], 1);
        assert_eq!(test.nodes["n2"]["129B to 256B"], 1);
        assert_eq!(test.nodes["n2"]["513B to 640B"], 0);
        assert_eq!(test.nodes["n1"]["257B to 512B"], 0);
    }

    #[test]
    fn test_old_builds_use_large_blocks() {
        let data: NodeHistograms =
            BTreeMap::from([("n1".to_string(), node_with("test", linear(1, vec![0, 3])))]);
        let builds = BTreeMap::from([("n1".to_string(), "3.0.1".to_string())]);

        let output = bytewise(&data, 5, &builds);
        assert_eq!(output["test"].columns, vec!["0B to 512B".to_string()]);
    }

    #[test]
    fn test_log_restructure_aligns_and_sorts_columns() {
        let log = |pairs: &[(&str, u64)]| {
            RawHistogram::Log(LogHistogram {
                histogram: "object-size".to_string(),
                units: "bytes".to_string(),
                data: pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            })
        };
        let data: NodeHistograms = BTreeMap::from([
            ("n1".to_string(), node_with("test", log(&[("1K-2K", 3), ("0-64", 1)]))),
            ("n2".to_string(), node_with("test", log(&[("64-128", 2)]))),
        ]);

        let output = restructure_log(&data);
        let test = &output["test"];

        assert_eq!(
            test.columns,
            vec!["0 to 64".to_string(), "64 to 128".to_string(), "1K to 2K".to_string()]
        );
        assert_eq!(test.nodes["n2"]["0 to 64"], 0);
        assert_eq!(test.nodes["n1"]["1K to 2K"], 3);
    }

    #[test]
    fn test_log_restructure_unrepresentable_range_sorts_last() {
        let data: NodeHistograms = BTreeMap::from([(
            "n1".to_string(),
            node_with(
                "test",
                RawHistogram::Log(LogHistogram {
                    histogram: "object-size".to_string(),
                    units: "bytes".to_string(),
                    data: vec![("16E-32E".to_string(), 1), ("0-64".to_string(), 1)],
                }),
            ),
        )]);

        let output = restructure_log(&data);
        assert_eq!(
            output["test"].columns,
            vec!["0 to 64".to_string(), "16E to 32E".to_string()]
        );
    }
}
