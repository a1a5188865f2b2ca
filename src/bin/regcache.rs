use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use regcache::{
    AvroSchemaParser, CachedSchemaRegistryClient, LoggingConfig, RegistryClientConfig, SchemaParser,
    SchemaWithId,
};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "regcache", version, about = "Cached schema registry CLI", author)]
struct Cli {
    /// Registry base url; falls back to SCHEMA_REGISTRY_URL and friends
    #[arg(long, global = true)]
    url: Option<String>,
    /// JSON client configuration file
    #[arg(long, global = true, conflicts_with = "url")]
    config: Option<PathBuf>,
    /// Print single-line JSON
    #[arg(long, global = true)]
    compact: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Subjects,
    Versions {
        subject: String,
    },
    Id {
        id: u32,
    },
    Get {
        subject: String,
        #[arg(long)]
        version: Option<u32>,
    },
    Register {
        subject: String,
        #[arg(long)]
        file: PathBuf,
    },
    Check {
        subject: String,
        #[arg(long)]
        file: PathBuf,
    },
    Delete {
        subject: String,
        #[arg(long)]
        version: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    LoggingConfig::init();

    let cli = Cli::parse();
    let config = match (&cli.url, &cli.config) {
        (Some(url), _) => RegistryClientConfig::new(url.clone()),
        (None, Some(path)) => RegistryClientConfig::from_file(path)?,
        (None, None) => RegistryClientConfig::from_env()?,
    };
    let client = CachedSchemaRegistryClient::from_config(config)?;

    let output = match cli.command {
        Command::Subjects => json!(client.subjects().await?),
        Command::Versions { subject } => json!(client.versions(&subject).await?),
        Command::Id { id } => {
            let schema = client.get_schema_by_id(id).await?;
            json!({ "id": id, "schema": schema.canonical_string() })
        }
        Command::Get { subject, version } => {
            let entry = match version {
                Some(version) => client.get_schema_by_subject(&subject, version).await?,
                None => client.get_latest_schema(&subject).await?,
            };
            render_entry(&subject, &entry)
        }
        Command::Register { subject, file } => {
            let schema = read_schema(&file)?;
            let id = client.register_new_schema(&subject, &schema).await?;
            json!({ "subject": subject, "id": id })
        }
        Command::Check { subject, file } => {
            let schema = read_schema(&file)?;
            match client.is_schema_registered(&subject, &schema).await? {
                Some(entry) => render_entry(&subject, &entry),
                None => json!({ "subject": subject, "registered": false }),
            }
        }
        Command::Delete { subject, version } => match version {
            Some(version) => json!(client.delete_subject_version(&subject, version).await?),
            None => json!(client.delete_subject(&subject).await?),
        },
    };

    let content = if cli.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{content}");
    Ok(())
}

fn read_schema(path: &Path) -> anyhow::Result<regcache::Schema> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read schema file `{}`", path.display()))?;
    Ok(AvroSchemaParser.parse(&text)?)
}

fn render_entry(subject: &str, entry: &SchemaWithId) -> Value {
    json!({
        "subject": subject,
        "registered": true,
        "id": entry.id,
        "version": entry.version,
        "schema": entry.schema.canonical_string(),
    })
}
