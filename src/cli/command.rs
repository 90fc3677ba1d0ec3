use std::path::PathBuf;

use crate::item::ReadStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Count { inbox: String, status: Option<ReadStatus>, log: bool },
    List { inbox: String, status: Option<ReadStatus>, log: bool },
    Seed { inbox: String, count: u64, out: Option<PathBuf> },
    Metrics,
}
