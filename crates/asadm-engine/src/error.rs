use std::fmt;

/// Result type for asadm-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Invariant violations inside a computation. Each aborts only the
/// computation that raised it; callers fall back where a fallback exists.
#[derive(Debug)]
pub enum Error {
    /// A node reported a namespace without any replication factor
    ReplicationFactorUnknown { namespace: String, node: String },

    /// Nodes disagree on a namespace's replication factor
    ReplicationFactorMismatch {
        namespace: String,
        expected: i64,
        found: i64,
    },

    /// No build version is known for a node that contributed data
    MissingBuild { node: String },

    /// Some nodes returned logarithmic histograms and others linear ones
    MixedHistogramFormats,

    /// Histogram text that could not be parsed
    MalformedHistogram(String),

    /// The usage agent response was unusable
    AgentResponse(String),

    /// Types layer error
    Types(asadm_types::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ReplicationFactorUnknown { namespace, node } => write!(
                f,
                "unable to determine replication factor for namespace {} on {}",
                namespace, node
            ),
            Error::ReplicationFactorMismatch {
                namespace,
                expected,
                found,
            } => write!(
                f,
                "different replication factor found across nodes for namespace {} ({} vs {})",
                namespace, expected, found
            ),
            Error::MissingBuild { node } => {
                write!(f, "could not find host {} in build responses", node)
            }
            Error::MixedHistogramFormats => {
                write!(f, "different histogram formats on different nodes")
            }
            Error::MalformedHistogram(msg) => write!(f, "malformed histogram: {}", msg),
            Error::AgentResponse(msg) => write!(f, "issue parsing agent response: {}", msg),
            Error::Types(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Types(err) => Some(err),
            _ => None,
        }
    }
}

impl From<asadm_types::Error> for Error {
    fn from(err: asadm_types::Error) -> Self {
        Error::Types(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Types(asadm_types::Error::Json(err))
    }
}
