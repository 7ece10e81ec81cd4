//! pqview: inspect and query Parquet and Arrow IPC files with SQL

mod shell;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pv_core::metadata::metadata_text;
use pv_core::{EventBus, ViewerConfig};
use pv_data::session::Session;
use pv_data::{LoadOutcome, QueryOutcome, QueryRunner, SchemaProbe, SessionController};
use pv_views::{render_metadata, render_result, render_schema, write_export, ExportFormat, TableConfig};
use tokio::runtime::Handle;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pqview")]
#[command(about = "Inspect and query Parquet and Arrow IPC files with SQL")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Maximum number of rows a query returns
    #[arg(long, global = true)]
    preview_cap: Option<usize>,

    /// Name that refers to the loaded file inside SQL
    #[arg(long, global = true)]
    placeholder: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the schema of a file, or of a query over it
    Schema {
        path: PathBuf,

        /// Describe this statement instead of the whole file
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Show file-level and key/value metadata
    Metadata {
        path: PathBuf,

        /// Print `key: value` lines instead of a table
        #[arg(long)]
        text: bool,
    },

    /// Run a statement (the default preview query if omitted)
    Query {
        path: PathBuf,

        sql: Option<String>,

        /// Prefix rows with their position
        #[arg(long)]
        row_numbers: bool,
    },

    /// Write the query result or the file schema to a directory
    Export {
        path: PathBuf,

        /// Destination directory
        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long, value_enum, default_value = "csv")]
        format: FormatArg,

        /// Export the file schema instead of a result
        #[arg(long)]
        schema: bool,

        /// Statement whose result is exported (default preview query if omitted)
        #[arg(long)]
        sql: Option<String>,
    },

    /// Interactive session
    Shell {
        /// File to load on start
        path: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

fn init_tracing() {
    // Logs go to stderr so stdout only carries data
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,datafusion=warn,parquet=warn,sqlparser=warn")),
        )
        .init();
}

fn load_config(cli: &Cli) -> Result<ViewerConfig> {
    let mut config = match &cli.config {
        Some(path) => ViewerConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ViewerConfig::default(),
    };

    if let Some(cap) = cli.preview_cap {
        config = config.with_preview_cap(cap);
    }
    if let Some(placeholder) = &cli.placeholder {
        config = config.with_placeholder(placeholder.clone());
    }

    config.validate()?;
    Ok(config)
}

/// Load `path` and wait for the session to become current
pub(crate) async fn open(controller: &SessionController, path: &Path) -> Result<Arc<Session>> {
    match controller.load(path)?.await? {
        LoadOutcome::Loaded(session) => Ok(session),
        LoadOutcome::Failed(e) => Err(e.into()),
        LoadOutcome::Superseded(id) => bail!("Load of session {} was superseded", id),
    }
}

/// Run `statement` and wait for the updated session
pub(crate) async fn run(controller: &SessionController, statement: &str) -> Result<Arc<Session>> {
    match controller.run(statement)?.await? {
        QueryOutcome::Completed(session) => Ok(session),
        QueryOutcome::Failed { error, .. } => Err(error.into()),
        QueryOutcome::Discarded(id) => bail!("Session {} was replaced before the query finished", id),
    }
}

/// Print the current result, or a short acknowledgement for effect-only statements
pub(crate) fn print_result(session: &Session, config: &TableConfig) -> Result<()> {
    if session.result().schema().is_empty() {
        println!("OK");
    } else {
        println!("{}", render_result(session.result(), config)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let runner = QueryRunner::new(&config)?;
    let events = Arc::new(EventBus::new());
    let controller = SessionController::new(runner, events.clone(), Handle::current());

    match cli.command {
        Commands::Schema { path, query } => {
            let session = open(&controller, &path).await?;
            let schema = match query {
                Some(query) => {
                    let rewritten = controller.runner().rewrite(&query);
                    SchemaProbe::describe_query(&rewritten, session.engine()).await?
                }
                None => session.file_schema().clone(),
            };
            println!("{}", render_schema(&schema)?);
        }

        Commands::Metadata { path, text } => {
            let session = open(&controller, &path).await?;
            if text {
                println!("{}", metadata_text(session.metadata()));
            } else {
                println!("{}", render_metadata(session.metadata())?);
            }
        }

        Commands::Query { path, sql, row_numbers } => {
            let mut session = open(&controller, &path).await?;
            if let Some(sql) = sql {
                session = run(&controller, &sql).await?;
            } else if let Some(error) = session.last_error() {
                return Err(anyhow!("{}", error));
            }

            let table = TableConfig {
                show_row_numbers: row_numbers,
                ..TableConfig::default()
            };
            print_result(&session, &table)?;
        }

        Commands::Export {
            path,
            output,
            format,
            schema,
            sql,
        } => {
            let mut session = open(&controller, &path).await?;
            if let Some(sql) = sql {
                session = run(&controller, &sql).await?;
            }

            let written = if schema {
                write_export(&output, session.handle(), session.file_schema(), format.into(), true)?
            } else {
                write_export(&output, session.handle(), session.result(), format.into(), false)?
            };
            info!("Export finished");
            println!("{}", written.display());
        }

        Commands::Shell { path } => {
            shell::run_shell(&controller, &events, path).await?;
        }
    }

    Ok(())
}
