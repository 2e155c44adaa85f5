//! Numeric constants whose value depends on the server build.
//!
//! Each table lists the build ranges that deviate from the default. The
//! boundaries are the releases that changed on-disk or wire behavior and
//! must stay exact.

use asadm_types::{Version, VersionRange};

/// First build that stores 39 bytes of per-record overhead instead of 35.
pub const SERVER_39_BYTE_OVERHEAD_FIRST_VERSION: &str = "7.0.0";

/// First build that answers the `histogram:` info command.
pub const SERVER_NEW_HISTOGRAM_FIRST_VERSION: &str = "4.2.0";

/// First build that answers the `latencies:` info command.
pub const SERVER_NEW_LATENCIES_CMD_FIRST_VERSION: &str = "5.1.0";

pub const DEFAULT_RECORD_OVERHEAD_BYTES: i64 = 35;

pub const RECORD_OVERHEAD_BYTES: &[(VersionRange, i64)] = &[(
    VersionRange::new(Some(SERVER_39_BYTE_OVERHEAD_FIRST_VERSION), None),
    39,
)];

pub const DEFAULT_RBLOCK_SIZE_BYTES: i64 = 128;

pub const RBLOCK_SIZE_BYTES: &[(VersionRange, i64)] = &[
    (VersionRange::new(None, Some("2.7.0")), 512),
    (VersionRange::new(Some("3.0.0"), Some("3.1.3")), 512),
];

fn lookup(table: &[(VersionRange, i64)], build: &Version, default: i64) -> i64 {
    table
        .iter()
        .find(|(range, _)| range.contains(build))
        .map(|(_, value)| *value)
        .unwrap_or(default)
}

/// Bytes of metadata stored per master record on `build`.
pub fn record_overhead_bytes(build: &Version) -> i64 {
    lookup(RECORD_OVERHEAD_BYTES, build, DEFAULT_RECORD_OVERHEAD_BYTES)
}

/// Storage write-block unit used by `build` for size histograms.
pub fn rblock_size_bytes(build: &Version) -> i64 {
    lookup(RBLOCK_SIZE_BYTES, build, DEFAULT_RBLOCK_SIZE_BYTES)
}

pub fn is_new_histogram_version(build: Option<&str>) -> bool {
    build
        .filter(|b| !b.is_empty())
        .is_some_and(|b| Version::parse(b).at_least(SERVER_NEW_HISTOGRAM_FIRST_VERSION))
}

pub fn is_new_latencies_version(build: Option<&str>) -> bool {
    build
        .filter(|b| !b.is_empty())
        .is_some_and(|b| Version::parse(b).at_least(SERVER_NEW_LATENCIES_CMD_FIRST_VERSION))
}
