mod context;

pub mod config;
pub mod features;
pub mod histogram;
pub mod namespaces;
pub mod stop_writes;
pub mod summary;

pub use context::HandlerContext;
