// Telemetry is a submodule of query
pub mod telemetry;

// Submodules for separation of concerns
pub mod aggregate;
pub mod builder;
pub mod eval;
pub mod exec;
pub mod metrics;
pub mod types;

// Public API re-exports
pub use aggregate::{AggregateResult, Collector, Page, aggregate, aggregate_pages};
pub use builder::InboxQuery;
pub use eval::eval_filter;
pub use exec::{execute, project_count, project_items};
pub use metrics::{QueryMetrics, combine};
pub use types::{FeedOptions, Filter, Selection, SqlParameter, SqlQuery};
