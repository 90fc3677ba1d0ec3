use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::DbError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReadStatus {
    Read,
    Unread,
}

impl ReadStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Unread => "UNREAD",
        }
    }

    /// Status assigned to the `sequence`-th seeded item: even is read, odd is unread.
    #[must_use]
    pub const fn for_sequence(sequence: i64) -> Self {
        if sequence % 2 == 0 { Self::Read } else { Self::Unread }
    }
}

impl fmt::Display for ReadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ReadStatus {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "READ" => Ok(Self::Read),
            "UNREAD" => Ok(Self::Unread),
            other => Err(DbError::InvalidArgument(format!("unknown read status: {other}"))),
        }
    }
}

/// One inbox entry as stored in the container. Field names are the wire names.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InboxItem {
    pub id: String,
    pub inbox_id: String,
    pub sort_key: i64,
    pub read_status: ReadStatus,
}

impl InboxItem {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        inbox_id: impl Into<String>,
        sort_key: i64,
        read_status: ReadStatus,
    ) -> Self {
        Self { id: id.into(), inbox_id: inbox_id.into(), sort_key, read_status }
    }
}
