//! notes-cli — note-taking demo for the modelkit persistence layer.
//!
//! Wires an adapter registry from environment variables, builds it against
//! the notes mapping, and runs simple commands through the default adapter.
//!
//! Run:
//! ```bash
//! # SQLite file storage (default); DATABASE_URL optional
//! cargo run -p notes-cli -- add "buy coffee"
//!
//! # volatile in-memory storage
//! ADAPTER_TYPE=memory cargo run -p notes-cli -- list
//! ```
//!
//! Configuration: see `config.rs` for all environment variables.

mod config;

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use modelkit::{
    Adapter, AdapterName, AdapterRegistry, AttributeKind, Collection, Mapper, ModelError, Record,
    RegisterOptions,
};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "notes-cli", version, about = "Notes on top of the modelkit adapter registry")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a note
    Add {
        title: String,
        #[arg(long)]
        body: Option<String>,
    },
    /// List all notes
    List,
    /// Show one note as JSON
    Show { id: u64 },
    /// Mark a note as done
    Done { id: u64 },
    /// Remove a note
    Rm { id: u64 },
    /// Remove every note
    Clear,
    /// Print the registered adapter configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);
    cfg.warn_if_volatile();

    if let Err(e) = run(cli, &cfg) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli, cfg: &config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let mapper = notes_mapper();

    let name = AdapterName::new(cfg.adapter_name.clone())?;
    let mut registry: AdapterRegistry = AdapterRegistry::new();
    registry.register(RegisterOptions::new(
        name.clone(),
        cfg.adapter_type,
        cfg.database_url.clone(),
    ))?;
    registry.build(&mapper)?;

    let adapter: Arc<dyn Adapter> = registry
        .adapters()
        .default()
        .ok_or("no default adapter was built")?
        .clone();
    info!(adapter = %name, adapter_type = %cfg.adapter_type, "adapter ready");

    match cli.command {
        Command::Add { title, body } => {
            let mut record = Record::new();
            record.insert("title".into(), Value::String(title));
            record.insert("body".into(), body.map(Value::String).unwrap_or(Value::Null));
            record.insert("done".into(), Value::Bool(false));
            record.insert("created_at".into(), Value::from(now_secs()));
            let id = adapter.create("notes", record)?;
            println!("created note #{id}");
        }
        Command::List => {
            let notes = adapter.all("notes")?;
            if notes.is_empty() {
                println!("no notes");
            }
            for note in &notes {
                println!("{} {} {}", id_of(note), status_mark(note), title_of(note));
            }
        }
        Command::Show { id } => match adapter.find("notes", id)? {
            Some(note) => println!("{}", serde_json::to_string_pretty(&Value::Object(note))?),
            None => println!("note #{id} not found"),
        },
        Command::Done { id } => {
            let mut note = adapter.find("notes", id)?.ok_or(ModelError::NotFound)?;
            note.insert("done".into(), Value::Bool(true));
            adapter.update("notes", id, note)?;
            println!("note #{id} done");
        }
        Command::Rm { id } => {
            adapter.delete("notes", id)?;
            println!("removed note #{id}");
        }
        Command::Clear => {
            adapter.clear("notes")?;
            println!("cleared notes");
        }
        Command::Config => {
            for (name, descriptor) in registry.descriptors().iter() {
                println!("{name}: {}", serde_json::to_string(descriptor)?);
            }
        }
    }

    Ok(())
}

/// The mapping the demo persists: a single `notes` collection.
fn notes_mapper() -> Mapper {
    Mapper::new().collection(
        Collection::new("notes")
            .attribute("title", AttributeKind::Text)
            .attribute("body", AttributeKind::Text)
            .attribute("done", AttributeKind::Boolean)
            .attribute("created_at", AttributeKind::Integer),
    )
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr; stdout is reserved for command output.
    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_secs()
}

fn id_of(note: &Record) -> String {
    note.get("id")
        .and_then(Value::as_u64)
        .map(|id| format!("#{id}"))
        .unwrap_or_else(|| "#?".to_string())
}

fn status_mark(note: &Record) -> &'static str {
    if note.get("done").and_then(Value::as_bool).unwrap_or(false) {
        "[x]"
    } else {
        "[ ]"
    }
}

fn title_of(note: &Record) -> &str {
    note.get("title")
        .and_then(Value::as_str)
        .unwrap_or("<untitled>")
}
