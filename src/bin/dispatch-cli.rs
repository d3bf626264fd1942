use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use edge_dispatch::config::load_config;
use edge_dispatch::Router;

#[derive(Parser)]
#[command(name = "dispatch-cli")]
#[command(about = "Management CLI for edge-dispatch", long_about = None)]
struct Cli {
    /// Admin API base URL.
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Admin API key.
    #[arg(short, long, default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server status
    Status,
    /// List the live route table
    Routes,
    /// Resolve a request against a config file without a running server
    Resolve {
        #[arg(short, long)]
        config: PathBuf,
        method: String,
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Status => admin_get(&cli.url, &cli.key, "/admin/status").await?,
        Commands::Routes => admin_get(&cli.url, &cli.key, "/admin/routes").await?,
        Commands::Resolve {
            config,
            method,
            path,
        } => resolve(&config, &method, &path)?,
    }

    Ok(())
}

fn resolve(config: &Path, method: &str, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    let router = Router::from_config(&config)?;
    let method: axum::http::Method = method.parse()?;

    match router.resolve(&method, path) {
        Some((route, params)) => {
            println!("{route} ({})", route.handler_kind());
            for (name, value) in params.iter() {
                println!("  {name} = {value}");
            }
        }
        None => println!("no match: {method} {path} -> 404"),
    }
    Ok(())
}

async fn admin_get(base: &str, key: &str, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {key}"))?);

    let res = reqwest::Client::new()
        .get(format!("{base}{path}"))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
