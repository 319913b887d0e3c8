use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kg_client::{ApiClient, ClientConfig, GraphLimit, QaRequest};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Query the knowledge-graph API from the command line.
///
/// Settings come from `KG_API_*` environment variables (a `.env` file is
/// loaded first if present); flags win.
#[derive(Debug, Parser)]
#[command(name = "kg", version)]
struct Cli {
    /// API base URL, e.g. http://localhost:8000/api
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in milliseconds.
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Node cap for `graph`: a positive number or `default`.
    #[arg(long, global = true)]
    limit: Option<GraphLimit>,

    /// Do not log request/response traffic.
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Core graph (highest-degree nodes).
    Graph,
    /// Every node and edge.
    Full,
    /// Graph around one entity.
    Entity { name: String },
    /// Entities whose name contains a keyword.
    Search { keyword: String },
    /// Ask a question.
    Ask {
        question: String,
        #[arg(long)]
        mode: Option<String>,
    },
    /// List all entity names.
    Entities,
    /// Related entities, heaviest relation first.
    Recommend { entity: String },
    /// Prerequisites and next steps for an entity.
    Path { entity: String },
}

impl Cli {
    /// Layer the flags over a base config.
    fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(limit) = self.limit {
            config.graph_limit = limit;
        }
        if self.quiet {
            config.log_traffic = false;
        }
        config
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.apply(ClientConfig::from_env().context("reading KG_API_* environment")?);
    debug!(base_url = %config.base_url, timeout = ?config.timeout, limit = %config.graph_limit, "client config");
    let client = ApiClient::new(config)?;

    match cli.command {
        Command::Graph => print_json(&client.get_graph_data().await?),
        Command::Full => print_json(&client.get_full_graph_data().await?),
        Command::Entity { name } => print_json(&client.get_graph_data_by_entity(&name).await?),
        Command::Search { keyword } => print_json(&client.fuzzy_search_entity(&keyword).await?),
        Command::Ask { question, mode } => {
            let mut request = QaRequest::new(question);
            request.mode = mode;
            print_json(&client.qa(request).await?)
        }
        Command::Entities => print_json(&client.get_entities().await?),
        Command::Recommend { entity } => print_json(&client.get_recommendations(&entity).await?),
        Command::Path { entity } => print_json(&client.get_learning_path(&entity).await?),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse()).await
}
