//! # apex: APEX Documents CLI
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  apex generate request.json      issue a new document                   │
//! │  apex edit <ID> request.json     issue the next version of a document   │
//! │  apex show <ID>                  print a stored document                │
//! │  apex render <ID>                write the rendered file again          │
//! │  apex status <ID> <STATUS>       pending | sent | paid | overdue | ...  │
//! │  apex search <QUERY>             find documents by number               │
//! │  apex versions <ID>              list the lineage of a document         │
//! │  apex delete <ID>                delete (a root takes its versions)     │
//! │  apex today [--type <TYPE>]      documents issued since midnight UTC    │
//! │                                                                         │
//! │  Global: --config <FILE>  --db <FILE>  --json                           │
//! │  Logging: APEX_LOG or RUST_LOG (default "info"), written to stderr      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Request files are the JSON form of `GenerateRequest` / `EditRequest`;
//! `-` reads the request from stdin.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use apex_core::validation::validate_document_id;
use apex_core::{Document, DocumentData, DocumentSummary, DocumentType};
use apex_db::Database;
use apex_engine::{
    DocumentRenderer, DocumentService, EditRequest, EngineConfig, GenerateRequest,
    IssuedDocument, JsonRenderer,
};
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "apex", about = "Issue and version APEX invoices, proformas and delivery notes", version)]
struct Cli {
    #[arg(long, global = true, help = "Config file (defaults to the platform config dir)")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "SQLite database file; overrides the config")]
    db: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Print results as pretty JSON"
    )]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue a new document from a JSON request.
    Generate {
        #[arg(help = "Request file, or - for stdin")]
        request: PathBuf,
    },
    /// Issue the next version of a document from a JSON request.
    Edit {
        #[arg(value_parser = parse_id)]
        id: String,
        #[arg(help = "Request file, or - for stdin")]
        request: PathBuf,
    },
    /// Print a stored document.
    Show {
        #[arg(value_parser = parse_id)]
        id: String,
    },
    /// Render a stored document to the output directory.
    Render {
        #[arg(value_parser = parse_id)]
        id: String,
    },
    /// Set the status of a document.
    Status {
        #[arg(value_parser = parse_id)]
        id: String,
        status: String,
    },
    /// Find documents whose number contains QUERY.
    Search { query: String },
    /// List every version in the lineage of a document.
    Versions {
        #[arg(value_parser = parse_id)]
        id: String,
    },
    /// Delete a document.
    Delete {
        #[arg(value_parser = parse_id)]
        id: String,
    },
    /// List documents issued since midnight UTC.
    Today {
        #[arg(long = "type", help = "Only count documents of this type")]
        document_type: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let mut config = EngineConfig::load(cli.config.clone()).context("failed to load configuration")?;
    if let Some(db) = &cli.db {
        config.database.path = db.clone();
    }

    let db = Database::new(config.db_config())
        .await
        .context("failed to open the document database")?;
    let renderer: Arc<dyn DocumentRenderer> = Arc::new(JsonRenderer);
    let service = DocumentService::new(Arc::new(db.clone()), renderer, config.documents.clone());

    let outcome = run(&service, cli.command, cli.json).await;
    db.close().await;
    outcome
}

async fn run(service: &DocumentService, command: Commands, json: bool) -> Result<()> {
    match command {
        Commands::Generate { request } => {
            let request: GenerateRequest = read_request(&request)?;
            let issued = service.generate(request).await?;
            report_issued(service, &issued, json)
        }
        Commands::Edit { id, request } => {
            let request: EditRequest = read_request(&request)?;
            let issued = service.edit(&id, request).await?;
            report_issued(service, &issued, json)
        }
        Commands::Show { id } => {
            let document = service.get(&id).await?;
            if json {
                print_json(&document)
            } else {
                print_document(&document);
                Ok(())
            }
        }
        Commands::Render { id } => {
            let path = render_stored(service, &id).await?;
            println!("{}", path.display());
            Ok(())
        }
        Commands::Status { id, status } => {
            let document = service.update_status(&id, &status).await?;
            if json {
                print_json(&document)
            } else {
                println!("{} is now {}", document.document_number, document.status);
                Ok(())
            }
        }
        Commands::Search { query } => {
            let hits = service.search(&query).await?;
            print_summaries(&hits, json)
        }
        Commands::Versions { id } => {
            let versions = service.versions(&id).await?;
            print_summaries(&versions, json)
        }
        Commands::Delete { id } => {
            service.delete(&id).await?;
            println!("Deleted {}", id);
            Ok(())
        }
        Commands::Today { document_type } => match document_type {
            Some(document_type) => {
                let document_type: DocumentType = document_type.parse()?;
                let count = service.issued_today_count(document_type).await?;
                if json {
                    print_json(&serde_json::json!({ "document_type": document_type, "count": count }))
                } else {
                    println!("{} {} issued today", count, document_type);
                    Ok(())
                }
            }
            None => {
                let documents = service.issued_today().await?;
                print_summaries(&documents, json)
            }
        },
    }
}

// =============================================================================
// Input
// =============================================================================

fn init_tracing() {
    let filter = EnvFilter::try_from_env("APEX_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_id(value: &str) -> Result<String, String> {
    validate_document_id(value).map_err(|e| e.to_string())?;
    Ok(value.to_string())
}

fn read_request<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read request from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read request file {}", path.display()))?
    };

    debug!(bytes = contents.len(), "Request read");
    serde_json::from_str(&contents).context("request is not valid JSON for this command")
}

// =============================================================================
// Output
// =============================================================================

fn report_issued(service: &DocumentService, issued: &IssuedDocument, json: bool) -> Result<()> {
    let document = &issued.document;

    let written = match &issued.rendered {
        Some(bytes) => match write_output(service, &document.document_number, bytes) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "Rendered document could not be written");
                None
            }
        },
        None => None,
    };

    if json {
        return print_json(&serde_json::json!({
            "document": document,
            "output": written,
            "render_error": issued.render_error,
        }));
    }

    print_document(document);
    match (&written, &issued.render_error) {
        (Some(path), _) => println!("Written to {}", path.display()),
        (None, Some(err)) => println!("Saved, but not rendered: {}", err),
        (None, None) => println!("Saved, but the rendered file was not written"),
    }
    Ok(())
}

/// Loads a stored document once and writes its rendering.
async fn render_stored(service: &DocumentService, id: &str) -> Result<PathBuf> {
    let document = service.get(id).await?;
    let bytes = service.renderer().render(&DocumentData::from(&document))?;
    write_output(service, &document.document_number, &bytes)
}

fn write_output(service: &DocumentService, document_number: &str, bytes: &[u8]) -> Result<PathBuf> {
    let dir = &service.settings().output_dir;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let path = dir.join(format!(
        "{}.{}",
        document_number,
        service.renderer().file_extension()
    ));
    std::fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;

    info!(path = %path.display(), "Rendered document written");
    Ok(path)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_document(document: &Document) {
    println!("{}  ({})", document.document_number, document.id);
    println!(
        "  {} v{}, {}, issued {}",
        document.document_type,
        document.version,
        document.status,
        document.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    if let Some(client) = &document.header.client_name {
        println!("  Client: {}", client);
    }

    for (index, item) in document.items.iter().enumerate() {
        match item.total_price {
            Some(total) => println!(
                "  {:>3}. {} x {} = {}",
                index + 1,
                item.quantity,
                item.description,
                total
            ),
            None => println!("  {:>3}. {} x {}", index + 1, item.quantity, item.description),
        }
    }

    if document.document_type.is_priced() {
        println!("  Subtotal: {}", document.subtotal);
        println!("  VAT ({}%): {}", document.vat_rate, document.vat_amount);
        println!("  Total: {}", document.total_amount);
    }
}

fn print_summaries(summaries: &[DocumentSummary], json: bool) -> Result<()> {
    if json {
        return print_json(&summaries);
    }

    if summaries.is_empty() {
        println!("No documents");
        return Ok(());
    }

    for s in summaries {
        println!(
            "{:<32} v{:<3} {:<10} {:>12}  {}  {}",
            s.document_number,
            s.version,
            s.status,
            s.total_amount,
            s.created_at.format("%Y-%m-%d %H:%M"),
            s.id
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_edit() {
        let cli = Cli::try_parse_from([
            "apex",
            "--json",
            "edit",
            "550e8400-e29b-41d4-a716-446655440000",
            "edit.json",
        ])
        .unwrap();

        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Edit { ref request, .. } if request == Path::new("edit.json")));
    }

    #[test]
    fn test_cli_rejects_malformed_id() {
        assert!(Cli::try_parse_from(["apex", "show", "not-an-id"]).is_err());
    }

    #[test]
    fn test_cli_today_type_flag() {
        let cli = Cli::try_parse_from(["apex", "today", "--type", "invoice", "--db", "/tmp/a.db"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/a.db")));
        assert!(matches!(cli.command, Commands::Today { document_type: Some(ref t) } if t == "invoice"));
    }

    #[tokio::test]
    async fn test_render_stored_writes_numbered_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(apex_db::DbConfig::in_memory()).await.unwrap();
        let settings = apex_engine::DocumentSettings {
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let service = DocumentService::new(Arc::new(db), Arc::new(JsonRenderer), settings);

        let request: GenerateRequest = serde_json::from_str(
            r#"{"document_type": "invoice", "items": [{"description": "Desk", "quantity": 2, "unit_price": "10"}]}"#,
        )
        .unwrap();
        let issued = service.generate(request).await.unwrap();

        let path = render_stored(&service, &issued.document.id).await.unwrap();
        assert_eq!(
            path,
            dir.path().join(format!("{}.json", issued.document.document_number))
        );

        let written: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written["document_number"], issued.document.document_number.as_str());
    }

    #[tokio::test]
    async fn test_render_stored_missing_document() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(apex_db::DbConfig::in_memory()).await.unwrap();
        let settings = apex_engine::DocumentSettings {
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let service = DocumentService::new(Arc::new(db), Arc::new(JsonRenderer), settings);

        assert!(render_stored(&service, "550e8400-e29b-41d4-a716-446655440000").await.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_read_request_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generate.json");
        std::fs::write(
            &path,
            r#"{"document_type": "invoice", "items": [{"description": "Desk", "quantity": 1, "unit_price": "10"}]}"#,
        )
        .unwrap();

        let request: GenerateRequest = read_request(&path).unwrap();
        assert_eq!(request.document_type, "invoice");
        assert_eq!(request.items.len(), 1);
    }
}
