pub mod summary;

pub use summary::SummaryView;
