//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use tracing::info;
use uuid::Uuid;

use scriptwatch_api::{AppState, IngestOutcome, ingest_payload, router};
use scriptwatch_fetcher::Fetcher;
use scriptwatch_registry::Registry;
use scriptwatch_shared::{
    AppConfig, FileDescriptor, FileId, FileRecord, init_config, load_config,
};
use scriptwatch_storage::Storage;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// scriptwatch — keep registered remote JavaScript files in sync.
#[derive(Parser)]
#[command(
    name = "scriptwatch",
    version,
    about = "Registry and content synchronization for remote JavaScript files.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the HTTP API server.
    Serve {
        /// Socket address to bind (overrides config).
        #[arg(long)]
        bind: Option<String>,
    },

    /// Register one remote JavaScript file.
    Add {
        /// Absolute URL of the file (path must end in .js).
        url: String,

        /// Fetch priority, 1 (highest) to 5.
        #[arg(short, long, default_value_t = 3)]
        priority: i64,

        /// Owning tenant UUID.
        #[arg(short, long)]
        company: String,

        /// Fetch the content immediately after registering.
        #[arg(long)]
        fetch: bool,
    },

    /// Fetch a registered file's content and update its record.
    Refresh {
        /// Record ID.
        id: String,
    },

    /// List registered files.
    List {
        /// Restrict to one tenant UUID.
        #[arg(short, long)]
        company: Option<String>,

        /// Refresh each record's content before listing.
        #[arg(long)]
        refresh: bool,
    },

    /// Process a queue-style JSON payload from a file or stdin.
    Ingest {
        /// Path to the payload file; reads stdin when omitted.
        file: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "scriptwatch=info",
        1 => "scriptwatch=debug",
        _ => "scriptwatch=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Serve { bind } => cmd_serve(bind.as_deref()).await,
        Command::Add {
            url,
            priority,
            company,
            fetch,
        } => cmd_add(&url, priority, &company, fetch).await,
        Command::Refresh { id } => cmd_refresh(&id).await,
        Command::List { company, refresh } => cmd_list(company.as_deref(), refresh).await,
        Command::Ingest { file } => cmd_ingest(file.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Open the store and build the shared registry from config.
async fn open_registry(config: &AppConfig) -> Result<Registry> {
    let storage = Storage::open(Path::new(&config.storage.db_path)).await?;
    let fetcher = Fetcher::new(&config.fetch)?;
    Ok(Registry::new(Arc::new(storage), fetcher))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_serve(bind: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let registry = Arc::new(open_registry(&config).await?);

    let bind = bind.unwrap_or(&config.server.bind);
    let app = router(AppState { registry });

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| eyre!("cannot bind '{bind}': {e}"))?;

    info!(addr = %listener.local_addr()?, "HTTP API listening");
    println!("scriptwatch API listening on http://{bind}");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn cmd_add(url: &str, priority: i64, company: &str, fetch: bool) -> Result<()> {
    let config = load_config()?;
    let registry = open_registry(&config).await?;

    let descriptor = FileDescriptor {
        url: url.into(),
        priority,
        company_id: company.into(),
    };

    let records = registry.add_files(&[descriptor]).await?;
    let record = records
        .into_iter()
        .next()
        .ok_or_else(|| eyre!("service returned no record for the descriptor"))?;

    if fetch {
        let outcome = registry.refresh_content(&record.id).await?;
        if let Some(e) = &outcome.fetch_error {
            println!("  Fetch failed ({e}); record registered without content.");
        }
        print_record(&outcome.record);
    } else {
        print_record(&record);
    }

    Ok(())
}

async fn cmd_refresh(id: &str) -> Result<()> {
    let config = load_config()?;
    let registry = open_registry(&config).await?;

    let id: FileId = id.parse().map_err(|e| eyre!("invalid record id '{id}': {e}"))?;
    let outcome = registry.refresh_content(&id).await?;

    if let Some(e) = &outcome.fetch_error {
        println!("  Fetch failed ({e}); returning stored content.");
    }
    print_record(&outcome.record);

    Ok(())
}

async fn cmd_list(company: Option<&str>, refresh: bool) -> Result<()> {
    let config = load_config()?;
    let registry = open_registry(&config).await?;

    let records = match company {
        Some(raw) => {
            let company_id: Uuid = raw
                .parse()
                .map_err(|e| eyre!("invalid company id '{raw}': {e}"))?;
            registry.list_by_company(&company_id, refresh).await?
        }
        None => registry.list_all(refresh).await?,
    };

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

async fn cmd_ingest(file: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let registry = open_registry(&config).await?;

    let body = match file {
        Some(path) => std::fs::read(path).map_err(|e| eyre!("cannot read '{}': {e}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };

    match ingest_payload(&registry, &body).await? {
        IngestOutcome::Added(records) => {
            println!("  Added {} file(s) from payload.", records.len());
            for record in &records {
                println!("  {}  {}", record.id, record.url);
            }
        }
        IngestOutcome::Dropped { reason } => {
            println!("  Payload dropped: {reason}");
        }
    }

    Ok(())
}

fn print_record(record: &FileRecord) {
    println!();
    println!("  ID:           {}", record.id);
    println!("  URL:          {}", record.url);
    println!("  Host:         {}", record.host);
    println!("  Priority:     {}", record.priority);
    println!("  Company:      {}", record.company_id);
    println!(
        "  Content:      {}",
        match &record.content {
            Some(c) => format!("{} bytes", c.len()),
            None => "none".into(),
        }
    );
    println!(
        "  Last fetched: {}",
        record
            .last_fetched
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".into())
    );
    println!();
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
