//! Histogram parsing and bucketing.

mod distribution;
mod parse;
mod percentiles;

pub use distribution::{NamespaceDistribution, bucket_range};
pub use parse::parse_raw_histogram;
pub use percentiles::{PercentileHistogram, decile_buckets};

use crate::error::{Error, Result};
use asadm_types::{Fetched, Keyed};
use serde::Serialize;
use std::collections::BTreeMap;

/// Fixed-width buckets starting at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinearHistogram {
    pub histogram: String,
    pub width: i64,
    pub data: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

/// Named ranges (`"0-64"`, `"64-128"`, ...) in server order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogHistogram {
    pub histogram: String,
    pub units: String,
    pub data: Vec<(String, u64)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RawHistogram {
    Linear(LinearHistogram),
    Log(LogHistogram),
}

/// Byte-distribution ranges shown when the caller does not pick a count.
pub const DEFAULT_BUCKET_COUNT: usize = 5;

/// `node -> namespace -> histogram`
pub type NodeHistograms = Keyed<Keyed<RawHistogram>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistogramFormat {
    Linear,
    Log,
}

/// The single format every successfully fetched histogram shares, or
/// `None` when there is nothing to look at. Legacy histograms carry no
/// units, so a mix of legacy and newer nodes is rejected too.
pub fn histogram_format(data: &NodeHistograms) -> Result<Option<HistogramFormat>> {
    let mut linear = false;
    let mut log = false;
    let mut units_present = false;
    let mut units_absent = false;

    for namespaces in data.values().filter_map(Fetched::data) {
        for hist in namespaces.values().filter_map(Fetched::data) {
            match hist {
                RawHistogram::Linear(h) => {
                    linear = true;
                    match h.units {
                        Some(_) => units_present = true,
                        None => units_absent = true,
                    }
                }
                RawHistogram::Log(_) => {
                    log = true;
                    units_present = true;
                }
            }
        }
    }

    if units_present && units_absent {
        return Err(Error::MixedHistogramFormats);
    }

    match (linear, log) {
        (true, true) => Err(Error::MixedHistogramFormats),
        (true, false) => Ok(Some(HistogramFormat::Linear)),
        (false, true) => Ok(Some(HistogramFormat::Log)),
        (false, false) => Ok(None),
    }
}

#[derive(Debug, Clone, Copy)]
pub enum HistogramMode<'a> {
    /// Decile boundaries per node.
    Percentiles,
    /// Object counts per byte range. `builds` maps node to build version and
    /// decides the storage block size.
    ByteDistribution {
        bucket_count: usize,
        builds: &'a BTreeMap<String, String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HistogramOutput {
    /// `namespace -> node -> percentiles`
    Percentiles(BTreeMap<String, BTreeMap<String, PercentileHistogram>>),
    /// `namespace -> distribution`
    Distribution(BTreeMap<String, NamespaceDistribution>),
}

pub fn create_histogram_output(
    name: &str,
    data: &NodeHistograms,
    mode: HistogramMode<'_>,
) -> Result<HistogramOutput> {
    match mode {
        HistogramMode::Percentiles => Ok(HistogramOutput::Percentiles(
            percentiles::percentiles_output(name, data),
        )),
        HistogramMode::ByteDistribution {
            bucket_count,
            builds,
        } => {
            let output = match histogram_format(data)? {
                Some(HistogramFormat::Log) => distribution::restructure_log(data),
                _ => distribution::bytewise(data, bucket_count, builds),
            };
            Ok(HistogramOutput::Distribution(output))
        }
    }
}
