//! Fixture seeding: top an inbox up to a target number of items.

use futures_util::stream::{self, StreamExt, TryStreamExt};

use crate::errors::DbError;
use crate::item::{InboxItem, ReadStatus};
use crate::query::builder::InboxQuery;

use super::Container;

/// Ensure `inbox_id` holds at least `max_count` items.
///
/// Existing items are counted first; sequence numbers `count..max_count` are then
/// created with fresh ids, `sortKey = sequence` and `READ`/`UNREAD` alternating on
/// even/odd sequence. At most `concurrency` creates are in flight and they
/// complete in sequence order. Returns how many items were added.
pub async fn ensure_entries<C>(
    container: &C,
    inbox_id: &str,
    max_count: u64,
    concurrency: usize,
) -> Result<u64, DbError>
where
    C: Container + ?Sized,
{
    let existing = InboxQuery::new(inbox_id)?.with_logging(false).count(container).await?;
    if existing >= max_count {
        return Ok(0);
    }
    let missing = max_count - existing;
    log::info!("Adding {missing} new inbox entries to {inbox_id}");
    let out_of_range = |_| DbError::InvalidArgument("max_count out of range".into());
    let first = i64::try_from(existing).map_err(out_of_range)?;
    let last = i64::try_from(max_count).map_err(out_of_range)?;
    stream::iter((first..last).map(|sequence| {
        let item = InboxItem::new(
            uuid::Uuid::new_v4().to_string(),
            inbox_id,
            sequence,
            ReadStatus::for_sequence(sequence),
        );
        async move { container.create_item(&item, inbox_id).await }
    }))
    .buffered(concurrency.max(1))
    .try_collect::<Vec<()>>()
    .await?;
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryContainer;

    #[tokio::test]
    async fn tops_up_only_the_missing_items() {
        let c = MemoryContainer::default();
        assert_eq!(ensure_entries(&c, "joe", 10, 3).await.unwrap(), 10);
        assert_eq!(ensure_entries(&c, "joe", 10, 3).await.unwrap(), 0);
        assert_eq!(ensure_entries(&c, "joe", 12, 3).await.unwrap(), 2);
        let items = InboxQuery::new("joe").unwrap().list(&c).await.unwrap();
        let mut keys: Vec<i64> = items.iter().map(|i| i.sort_key).collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..12).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn rejects_empty_inbox() {
        let c = MemoryContainer::default();
        assert!(matches!(ensure_entries(&c, "", 1, 1).await, Err(DbError::InvalidArgument(_))));
    }
}
