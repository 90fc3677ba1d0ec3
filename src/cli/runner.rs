use std::io::Write;

use crate::config::Settings;
use crate::errors::DbError;
use crate::item::ReadStatus;
use crate::query::{InboxQuery, telemetry};
use crate::store::{MemoryContainer, ensure_entries};

use super::command::Command;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputMode {
    Human,
    Plain,
    Json,
}

fn build_query(
    settings: &Settings,
    inbox: &str,
    status: Option<ReadStatus>,
    log: bool,
) -> Result<InboxQuery, DbError> {
    Ok(InboxQuery::new(inbox)?
        .with_status(status)
        .with_logging(log)
        .with_page_size(settings.page_size))
}

pub async fn run_with_format<W: Write>(
    container: &MemoryContainer,
    settings: &Settings,
    cmd: Command,
    mode: OutputMode,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Command::Count { inbox, status, log } => {
            let n = build_query(settings, &inbox, status, log)?.count(container).await?;
            match mode {
                OutputMode::Json => writeln!(out, "{}", serde_json::json!({"inbox": inbox, "count": n}))?,
                OutputMode::Plain => writeln!(out, "{n}")?,
                OutputMode::Human => writeln!(out, "Item count = {n}")?,
            }
            Ok(())
        }
        Command::List { inbox, status, log } => {
            let items = build_query(settings, &inbox, status, log)?.list(container).await?;
            match mode {
                OutputMode::Human => {
                    for it in &items {
                        writeln!(out, "{:>6}  {:<6}  {}", it.sort_key, it.read_status, it.id)?;
                    }
                    writeln!(out, "Item count = {}", items.len())?;
                }
                OutputMode::Plain | OutputMode::Json => {
                    for it in &items {
                        writeln!(out, "{}", serde_json::to_string(it)?)?;
                    }
                }
            }
            Ok(())
        }
        Command::Seed { inbox, count, out: dump } => {
            let added = ensure_entries(container, &inbox, count, settings.seed_concurrency).await?;
            let total = build_query(settings, &inbox, None, false)?.count(container).await?;
            if let Some(path) = dump {
                let f = std::fs::File::create(&path)?;
                container.write_ndjson(std::io::BufWriter::new(f))?;
            }
            match mode {
                OutputMode::Json => {
                    writeln!(out, "{}", serde_json::json!({"inbox": inbox, "added": added, "count": total}))?;
                }
                OutputMode::Plain => writeln!(out, "added={added} count={total}")?,
                OutputMode::Human => writeln!(out, "Added {added} entries; item count = {total}")?,
            }
            Ok(())
        }
        Command::Metrics => {
            write!(out, "{}", telemetry::metrics_text())?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run_to_string(c: &MemoryContainer, cmd: Command, mode: OutputMode) -> String {
        let mut buf = Vec::new();
        run_with_format(c, &Settings::default(), cmd, mode, &mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn seed_then_count_unread() {
        let c = MemoryContainer::default();
        let seed = Command::Seed { inbox: "joe".into(), count: 6, out: None };
        let seeded = run_to_string(&c, seed, OutputMode::Plain).await;
        assert_eq!(seeded.trim(), "added=6 count=6");
        let cmd = Command::Count { inbox: "joe".into(), status: Some(ReadStatus::Unread), log: false };
        assert_eq!(run_to_string(&c, cmd, OutputMode::Plain).await.trim(), "3");
    }

    #[tokio::test]
    async fn list_json_emits_one_item_per_line() {
        let c = MemoryContainer::default();
        let seed = Command::Seed { inbox: "ann".into(), count: 4, out: None };
        run_to_string(&c, seed, OutputMode::Plain).await;
        let cmd = Command::List { inbox: "ann".into(), status: Some(ReadStatus::Read), log: false };
        let text = run_to_string(&c, cmd, OutputMode::Json).await;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.contains("\"readStatus\":\"READ\"")));
    }

    #[tokio::test]
    async fn list_human_columns_line_up() {
        let c = MemoryContainer::default();
        let seed = Command::Seed { inbox: "bo".into(), count: 2, out: None };
        run_to_string(&c, seed, OutputMode::Plain).await;
        let cmd = Command::List { inbox: "bo".into(), status: None, log: false };
        let text = run_to_string(&c, cmd, OutputMode::Human).await;
        let id_columns: Vec<usize> = text
            .lines()
            .filter(|l| !l.starts_with("Item count"))
            .map(|l| l.len() - 36)
            .collect();
        assert_eq!(id_columns.len(), 2);
        assert_eq!(id_columns[0], id_columns[1]);
        assert!(text.contains("READ    "));
    }

    #[tokio::test]
    async fn empty_inbox_is_an_error() {
        let c = MemoryContainer::default();
        let mut buf = Vec::new();
        let cmd = Command::Count { inbox: String::new(), status: None, log: false };
        assert!(run_with_format(&c, &Settings::default(), cmd, OutputMode::Plain, &mut buf).await.is_err());
    }
}
