//! Cotify CLI
//!
//! Runs the Cotify API server and talks to a running one.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cotify_api::{ApiConfig, ApiServer};
use cotify_client::{CotifyClient, Item, ListItemsQuery, StoreItemRequest};

/// Cotify - deduplicating store for URL-tagged items
#[derive(Parser)]
#[command(name = "cotify")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Server to talk to
    #[arg(long, global = true, env = "COTIFY_SERVER", default_value = "http://localhost:3000")]
    server: String,

    /// Print raw JSON instead of formatted output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "COTIFY_PORT", default_value = "3000")]
        port: u16,
        /// Bind address
        #[arg(short, long, default_value = "0.0.0.0")]
        bind: String,
    },

    /// Store an item (returns the existing one if the URL is known)
    Store {
        /// Item URL
        url: String,
        /// Item title
        #[arg(short, long)]
        title: String,
        /// Item type, e.g. "video"
        #[arg(short = 'k', long = "type")]
        kind: String,
        /// Opaque metadata
        #[arg(short, long, default_value = "")]
        metadata: String,
    },

    /// Look up an item by URL
    Get {
        /// Item URL
        url: String,
    },

    /// List items
    List {
        /// Filter by type
        #[arg(short = 'k', long = "type")]
        kind: Option<String>,
        /// Created at or after (RFC 3339)
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        /// Created at or before (RFC 3339)
        #[arg(long)]
        to: Option<DateTime<Utc>>,
        /// Items to skip
        #[arg(long, default_value = "0")]
        offset: usize,
        /// Maximum items to show
        #[arg(short, long, default_value = "100")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "cotify=debug,info"
    } else {
        "cotify=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Serve { port, bind } => cmd_serve(port, &bind).await,
        Commands::Store {
            url,
            title,
            kind,
            metadata,
        } => {
            let request = StoreItemRequest::new(url, title, kind).with_metadata(metadata);
            cmd_store(&client(&cli.server)?, request, cli.json).await
        }
        Commands::Get { url } => cmd_get(&client(&cli.server)?, &url, cli.json).await,
        Commands::List {
            kind,
            from,
            to,
            offset,
            limit,
        } => {
            let mut query = ListItemsQuery::default()
                .between(from, to)
                .page(offset, limit);
            if let Some(kind) = kind {
                query = query.kind(kind);
            }
            cmd_list(&client(&cli.server)?, &query, cli.json).await
        }
    }
}

fn client(server: &str) -> Result<CotifyClient> {
    CotifyClient::new(server).with_context(|| format!("Invalid server URL: {server}"))
}

/// Run API server
async fn cmd_serve(port: u16, bind: &str) -> Result<()> {
    println!("{}", "🚀 Starting Cotify API server...".cyan().bold());

    let config = ApiConfig::from_env();
    let backend = if config.database_url.is_some() {
        "turso"
    } else {
        "memory"
    };
    let server = ApiServer::connect(config)
        .await
        .context("Failed to open record store")?;

    println!("   {} {}", "Backend:".green(), backend);
    println!("   {} http://{}:{}", "Listening on:".green(), bind, port);
    println!("   {} http://{}:{}/health", "Health check:".dimmed(), bind, port);
    println!("\n   Press Ctrl+C to stop.\n");

    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid bind address: {bind}:{port}"))?;
    server.run(addr).await?;

    Ok(())
}

/// Store an item
async fn cmd_store(client: &CotifyClient, request: StoreItemRequest, json: bool) -> Result<()> {
    let stored = client
        .store(&request)
        .await
        .with_context(|| format!("Failed to store {}", request.url))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stored)?);
        return Ok(());
    }

    if stored.is_new {
        println!("{}", "✅ Stored new item".green().bold());
    } else {
        println!("{}", "ℹ️  Item already stored".yellow().bold());
    }
    print_item(&stored.item);
    Ok(())
}

/// Look up an item
async fn cmd_get(client: &CotifyClient, url: &str, json: bool) -> Result<()> {
    let item = client
        .lookup(url)
        .await
        .with_context(|| format!("Failed to look up {url}"))?;

    match item {
        Some(item) if json => println!("{}", serde_json::to_string_pretty(&item)?),
        Some(item) => print_item(&item),
        None => println!("{} {}", "No item for".yellow(), url),
    }
    Ok(())
}

/// List items
async fn cmd_list(client: &CotifyClient, query: &ListItemsQuery, json: bool) -> Result<()> {
    let list = client.list(query).await.context("Failed to list items")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    if list.items.is_empty() {
        println!("{}", "No items found.".yellow());
        return Ok(());
    }

    println!(
        "{} {} of {} item(s)",
        "📋".cyan(),
        list.items.len(),
        list.total
    );
    for item in &list.items {
        println!(
            "   #{:<6} {:<8} {}  {}",
            item.id,
            item.kind.cyan(),
            item.url,
            item.title.dimmed()
        );
    }
    Ok(())
}

fn print_item(item: &Item) {
    println!("   {} {}", "ID:".green(), item.id);
    println!("   {} {}", "URL:".green(), item.url);
    println!("   {} {}", "Title:".green(), item.title);
    println!("   {} {}", "Type:".green(), item.kind);
    if !item.metadata.is_empty() {
        println!("   {} {}", "Metadata:".green(), item.metadata);
    }
    println!("   {} {}", "Created:".dimmed(), item.created_at.to_rfc3339());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_store() {
        let cli = Cli::try_parse_from([
            "cotify", "store", "https://x.test/a", "--title", "A", "--type", "video",
        ])
        .unwrap();

        match cli.command {
            Commands::Store {
                url,
                title,
                kind,
                metadata,
            } => {
                assert_eq!(url, "https://x.test/a");
                assert_eq!(title, "A");
                assert_eq!(kind, "video");
                assert_eq!(metadata, "");
            }
            _ => panic!("expected store"),
        }
    }

    #[test]
    fn test_parse_list_time_bounds() {
        let cli = Cli::try_parse_from([
            "cotify",
            "list",
            "--type",
            "audio",
            "--from",
            "2024-05-01T00:00:00Z",
        ])
        .unwrap();

        match cli.command {
            Commands::List { kind, from, to, .. } => {
                assert_eq!(kind.as_deref(), Some("audio"));
                assert!(from.is_some());
                assert!(to.is_none());
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_parse_list_rejects_bad_time() {
        assert!(Cli::try_parse_from(["cotify", "list", "--from", "yesterday"]).is_err());
    }
}
