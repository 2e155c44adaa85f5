// Engine module - pure aggregation over already-fetched node data.
// Nothing here performs I/O: the info client (or a captured snapshot) hands
// over completed per-node maps, failed nodes included, and the functions
// below derive summaries, feature usage, stop-writes causes and histograms.

pub mod error;
pub mod features;
pub mod gates;
pub mod histogram;
pub mod inputs;
pub mod size;
pub mod stop_writes;
pub mod summary;

pub use error::{Error, Result};
pub use features::{FEATURE_CHECKS, FeatureCheck, NodeFeatures, find_features_for_cluster, find_nodewise_features};
pub use histogram::{
    HistogramMode, HistogramOutput, RawHistogram, create_histogram_output, parse_raw_histogram,
};
pub use inputs::{ClusterMetadata, ClusterStats};
pub use stop_writes::{StopWritesEntry, StopWritesSummary, create_stop_writes_summary};
pub use summary::{LicenseUsage, StorageUsage, Summary, create_summary};
