//! Storage collaborator seam.
//!
//! The query layer only needs two things from a document container: run a
//! partition-scoped query as a lazy feed of pages, and create an item.

pub mod memory;
pub mod seed;

use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;

use crate::errors::DbError;
use crate::item::InboxItem;
use crate::query::aggregate::Page;
use crate::query::types::{FeedOptions, SqlQuery};

pub use memory::MemoryContainer;
pub use seed::ensure_entries;

/// Lazy feed of response pages. Always yields at least one page on success.
pub type PageStream<'a> = BoxStream<'a, Result<Page, DbError>>;

pub trait Container: Send + Sync {
    /// Execute `query` against the partition named by `options.partition_key`.
    fn query_items<'a>(&'a self, query: &SqlQuery, options: &FeedOptions) -> PageStream<'a>;

    fn create_item<'a>(
        &'a self,
        item: &InboxItem,
        partition_key: &str,
    ) -> BoxFuture<'a, Result<(), DbError>>;
}

impl<C: Container + ?Sized> Container for std::sync::Arc<C> {
    fn query_items<'a>(&'a self, query: &SqlQuery, options: &FeedOptions) -> PageStream<'a> {
        (**self).query_items(query, options)
    }

    fn create_item<'a>(
        &'a self,
        item: &InboxItem,
        partition_key: &str,
    ) -> BoxFuture<'a, Result<(), DbError>> {
        (**self).create_item(item, partition_key)
    }
}
