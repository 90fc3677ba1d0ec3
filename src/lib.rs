//! Fluent read-status queries over a partitioned inbox container.
//!
//! ```no_run
//! # use inboxquery::{DbError, MemoryContainer};
//! # async fn demo(container: &MemoryContainer) -> Result<(), DbError> {
//! use inboxquery::{InboxQuery, ReadStatus};
//! let unread = InboxQuery::new("joe")?.with_status(ReadStatus::Unread).count(container).await?;
//! let items = InboxQuery::new("joe")?.with_logging(true).list(container).await?;
//! # let _ = (unread, items);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod item;
pub mod logger;
pub mod query;
pub mod store;
pub mod utils;

pub use errors::DbError;
pub use item::{InboxItem, ReadStatus};
pub use query::{InboxQuery, QueryMetrics};
pub use store::{Container, MemoryContainer};
