//! Interactive shell over a session controller

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use pv_core::events::events::StaleResultDropped;
use pv_core::events::typed_handler;
use pv_core::EventBus;
use pv_data::{DataError, SessionController};
use pv_views::{render_metadata, render_schema, write_export, ExportFormat, TableConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;

use crate::{open, print_result, run};

const HELP: &str = "\
Enter SQL, using the placeholder name for the loaded file.
  .load <path>               load a .parquet, .arrow, .feather or .ipc file
  .schema                    show the file schema
  .metadata                  show file metadata
  .export <dir> [csv|json]   write the current result to <dir>
  .export-schema <dir> [csv|json]
                             write the file schema to <dir>
  .help                      show this help
  .quit                      leave the shell";

/// One parsed shell input line
#[derive(Debug, PartialEq)]
pub enum ShellCommand {
    Sql(String),
    Load(PathBuf),
    Schema,
    Metadata,
    Export {
        dir: PathBuf,
        format: ExportFormat,
        schema_only: bool,
    },
    Help,
    Quit,
    Empty,
}

impl ShellCommand {
    /// Parse a line; dot commands are case-sensitive, SQL is passed through
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(ShellCommand::Empty);
        }
        if !line.starts_with('.') {
            return Ok(ShellCommand::Sql(line.trim_end_matches(';').to_string()));
        }

        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match (command, args.as_slice()) {
            (".quit" | ".exit", []) => Ok(ShellCommand::Quit),
            (".help", []) => Ok(ShellCommand::Help),
            (".schema", []) => Ok(ShellCommand::Schema),
            (".metadata", []) => Ok(ShellCommand::Metadata),
            (".load", [path]) => Ok(ShellCommand::Load(PathBuf::from(path))),
            (".export" | ".export-schema", [dir, rest @ ..]) if rest.len() <= 1 => {
                let format = match rest.first() {
                    Some(name) => ExportFormat::from_name(name)
                        .ok_or_else(|| format!("Unknown export format: {}", name))?,
                    None => ExportFormat::Csv,
                };
                Ok(ShellCommand::Export {
                    dir: PathBuf::from(dir),
                    format,
                    schema_only: command == ".export-schema",
                })
            }
            _ => Err(format!("Unrecognized command: {} (try .help)", line)),
        }
    }
}

/// Line printed when a statement could not be run
fn failure_message(error: &anyhow::Error) -> String {
    match error.downcast_ref::<DataError>() {
        Some(DataError::NoSession) => "No file is loaded; use .load <path>".to_string(),
        _ => format!("Error: {}", error),
    }
}

// Load and query failures are printed where they are awaited
fn subscribe_notices(events: &EventBus) {
    events.subscribe::<StaleResultDropped>(typed_handler::<StaleResultDropped, _>(|e| {
        eprintln!("Ignored a late result for replaced session {}", e.session_id);
    }));
}

/// Read commands from stdin until `.quit` or end of input
pub async fn run_shell(
    controller: &SessionController,
    events: &Arc<EventBus>,
    initial: Option<PathBuf>,
) -> Result<()> {
    subscribe_notices(events);
    let table = TableConfig::default();

    if let Some(path) = initial {
        load(controller, &path, &table).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("pqview> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match ShellCommand::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{}", message);
                continue;
            }
        };

        match command {
            ShellCommand::Empty => {}
            ShellCommand::Quit => break,
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Load(path) => load(controller, &path, &table).await,
            ShellCommand::Sql(statement) => match run(controller, &statement).await {
                Ok(session) => print_result(&session, &table)?,
                Err(e) => eprintln!("{}", failure_message(&e)),
            },
            ShellCommand::Schema => match controller.current() {
                Some(session) => println!("{}", render_schema(session.file_schema())?),
                None => eprintln!("No file is loaded"),
            },
            ShellCommand::Metadata => match controller.current() {
                Some(session) => println!("{}", render_metadata(session.metadata())?),
                None => eprintln!("No file is loaded"),
            },
            ShellCommand::Export {
                dir,
                format,
                schema_only,
            } => {
                let Some(session) = controller.current() else {
                    eprintln!("No file is loaded");
                    continue;
                };
                let written = if schema_only {
                    write_export(&dir, session.handle(), session.file_schema(), format, true)
                } else {
                    write_export(&dir, session.handle(), session.result(), format, false)
                };
                match written {
                    Ok(path) => println!("Wrote {}", path.display()),
                    Err(e) => eprintln!("Export failed: {}", e),
                }
            }
        }
    }

    Ok(())
}

async fn load(controller: &SessionController, path: &Path, table: &TableConfig) {
    match open(controller, path).await {
        Ok(session) => {
            println!(
                "Loaded {} ({} columns)",
                session.handle().file_name(),
                session.file_schema().len()
            );
            match session.last_error() {
                Some(message) => eprintln!("Default query failed: {}", message),
                None => {
                    if let Err(e) = print_result(&session, table) {
                        error!("Failed to render result: {}", e);
                    }
                }
            }
        }
        Err(e) => eprintln!("Could not load {}: {}", path.display(), e),
    }
}
