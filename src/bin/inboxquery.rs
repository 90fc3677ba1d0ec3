use clap::{Parser, Subcommand, ValueEnum};
use inboxquery::cli::{self as prog_cli, OutputMode};
use inboxquery::config::Settings;
use inboxquery::query::telemetry;
use inboxquery::{MemoryContainer, ReadStatus};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "inboxquery",
    version,
    about = "Read-status queries over partitioned inboxes",
    long_about = None
)]
struct Cli {
    #[arg(
        long,
        help = "Path to a config file (TOML). If omitted, INBOXQUERY_CONFIG or ./inboxquery.toml is used."
    )]
    config: Option<PathBuf>,
    #[arg(long, help = "NDJSON file of inbox items to load into the container before running")]
    data: Option<PathBuf>,
    #[arg(
        long,
        value_enum,
        default_value_t = Format::Human,
        help = "Output format: human tables, or one record per line (plain/json; list emits NDJSON)"
    )]
    format: Format,
    #[arg(long, help = "Rows per page; overrides config and environment")]
    page_size: Option<usize>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Format {
    Human,
    Plain,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Status {
    Read,
    Unread,
}

impl From<Status> for ReadStatus {
    fn from(s: Status) -> Self {
        match s {
            Status::Read => Self::Read,
            Status::Unread => Self::Unread,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Count items in an inbox")]
    Count {
        #[arg(long, help = "Inbox id (partition key)")]
        inbox: String,
        #[arg(long, value_enum, help = "Only count items with this read status")]
        status: Option<Status>,
        #[arg(long, help = "Log query text and server metrics")]
        log: bool,
    },
    #[command(about = "List items in an inbox")]
    List {
        #[arg(long, help = "Inbox id (partition key)")]
        inbox: String,
        #[arg(long, value_enum, help = "Only list items with this read status")]
        status: Option<Status>,
        #[arg(long, help = "Log query text and server metrics")]
        log: bool,
    },
    #[command(about = "Top an inbox up to COUNT items, alternating READ/UNREAD")]
    Seed {
        #[arg(long, help = "Inbox id (partition key)")]
        inbox: String,
        #[arg(long, help = "Target number of items")]
        count: u64,
        #[arg(long, help = "Write the whole container to this NDJSON file afterwards")]
        out: Option<PathBuf>,
    },
    #[command(about = "Print process query counters (OpenMetrics text)")]
    Metrics,
}

impl From<Commands> for prog_cli::Command {
    fn from(c: Commands) -> Self {
        match c {
            Commands::Count { inbox, status, log } => {
                Self::Count { inbox, status: status.map(Into::into), log }
            }
            Commands::List { inbox, status, log } => {
                Self::List { inbox, status: status.map(Into::into), log }
            }
            Commands::Seed { inbox, count, out } => Self::Seed { inbox, count, out },
            Commands::Metrics => Self::Metrics,
        }
    }
}

async fn real_main(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(n) = cli.page_size {
        settings.page_size = n;
        settings.validate()?;
    }
    if let Err(e) = inboxquery::logger::configure_from_settings(&settings) {
        eprintln!("warning: logging not configured: {e}");
    }
    telemetry::set_slow_query_ms(settings.slow_query_ms);

    let container = MemoryContainer::default();
    if let Some(path) = &cli.data {
        let n = container.load_ndjson_file(path)?;
        log::info!("Loaded {n} items from {}", path.display());
    }
    let mode = match cli.format {
        Format::Human => OutputMode::Human,
        Format::Plain => OutputMode::Plain,
        Format::Json => OutputMode::Json,
    };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    prog_cli::run_with_format(&container, &settings, cli.command.into(), mode, &mut out).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = real_main(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
