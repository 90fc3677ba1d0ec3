use serde_json::Value;

use crate::errors::DbError;
use crate::item::ReadStatus;

use super::types::{DEFAULT_PAGE_SIZE, FeedOptions, Filter, Selection, SqlParameter, SqlQuery};

/// Query over a single inbox partition, optionally narrowed by read status.
///
/// The value is immutable once built; `with_*` consume and return a new value so a
/// configured query can be cloned and reused without shared mutable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxQuery {
    inbox_id: String,
    status: Option<ReadStatus>,
    logging: bool,
    page_size: usize,
}

impl InboxQuery {
    pub fn new(inbox_id: impl Into<String>) -> Result<Self, DbError> {
        let inbox_id = inbox_id.into();
        if inbox_id.trim().is_empty() {
            return Err(DbError::InvalidArgument("inbox id must not be empty".into()));
        }
        Ok(Self { inbox_id, status: None, logging: false, page_size: DEFAULT_PAGE_SIZE })
    }

    /// Filter on read status; `None` clears the filter.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<Option<ReadStatus>>) -> Self {
        self.status = status.into();
        self
    }

    /// Log query text and combined metrics, and ask the container to collect metrics.
    #[must_use]
    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    /// Rows per page requested from the container. Zero falls back to the default.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };
        self
    }

    #[must_use]
    pub fn inbox_id(&self) -> &str {
        &self.inbox_id
    }

    #[must_use]
    pub const fn status(&self) -> Option<ReadStatus> {
        self.status
    }

    #[must_use]
    pub const fn logging(&self) -> bool {
        self.logging
    }

    #[must_use]
    pub fn build(&self, selection: Selection) -> SqlQuery {
        let mut text = format!("SELECT {} FROM c WHERE c.inboxId = @inboxId", selection.clause());
        let mut parameters = vec![SqlParameter {
            name: "@inboxId".into(),
            value: Value::from(self.inbox_id.as_str()),
        }];
        let mut clauses = vec![Filter::eq("inboxId", self.inbox_id.as_str())];
        if let Some(status) = self.status {
            text.push_str(" AND c.readStatus = @readStatus");
            parameters.push(SqlParameter {
                name: "@readStatus".into(),
                value: Value::from(status.as_str()),
            });
            clauses.push(Filter::eq("readStatus", status.as_str()));
        }
        SqlQuery { text, parameters, selection, filter: Filter::And(clauses) }
    }

    #[must_use]
    pub fn feed_options(&self) -> FeedOptions {
        FeedOptions {
            partition_key: self.inbox_id.clone(),
            populate_query_metrics: self.logging,
            max_item_count: self.page_size,
        }
    }
}
