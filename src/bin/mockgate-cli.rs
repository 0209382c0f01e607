use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "mockgate-cli")]
#[command(about = "Management CLI for a running mockgate", long_about = None)]
struct Cli {
    /// Admin API base URL
    #[arg(short, long, env = "MOCKGATE_ADMIN_URL", default_value = "http://127.0.0.1:3001")]
    url: String,

    /// Admin API key; omit when the server runs without one
    #[arg(short, long, env = "MOCKGATE_ADMIN_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version, proxy target and endpoint counts
    Status,
    /// Print every feature and endpoint
    Features,
    /// Create an empty feature
    CreateFeature { name: String },
    /// Delete a feature and its file
    DeleteFeature { name: String },
    /// Add an endpoint read from a JSON file
    AddEndpoint { feature: String, file: PathBuf },
    /// Delete an endpoint
    DeleteEndpoint { feature: String, id: String },
    /// Flip an endpoint between mocked and proxied
    Toggle { feature: String, id: String },
    /// Choose which named response an endpoint serves
    SetResponse { feature: String, id: String, response: String },
    /// Show proxy settings
    Proxy,
    /// Point the proxy at a new upstream
    SetTarget { url: String },
    /// Enable or disable Host rewriting
    SetChangeOrigin {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Re-read the configuration directory
    Reload,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if !cli.key.is_empty() {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", cli.key))?);
    }

    let base = cli.url.trim_end_matches('/');
    let request = |method: Method, path: String| -> RequestBuilder {
        client
            .request(method, format!("{}/admin{}", base, path))
            .headers(headers.clone())
    };

    let builder = match cli.command {
        Commands::Status => request(Method::GET, "/status".into()),
        Commands::Features => request(Method::GET, "/features".into()),
        Commands::CreateFeature { name } => {
            request(Method::POST, "/features".into()).json(&json!({ "feature": name }))
        }
        Commands::DeleteFeature { name } => request(Method::DELETE, format!("/features/{}", name)),
        Commands::AddEndpoint { feature, file } => {
            let endpoint: Value = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
            request(Method::POST, format!("/features/{}/endpoints", feature)).json(&endpoint)
        }
        Commands::DeleteEndpoint { feature, id } => {
            request(Method::DELETE, format!("/features/{}/endpoints/{}", feature, id))
        }
        Commands::Toggle { feature, id } => {
            request(Method::POST, format!("/features/{}/endpoints/{}/toggle", feature, id))
        }
        Commands::SetResponse { feature, id, response } => {
            request(Method::PUT, format!("/features/{}/endpoints/{}/response", feature, id))
                .json(&json!({ "response": response }))
        }
        Commands::Proxy => request(Method::GET, "/proxy".into()),
        Commands::SetTarget { url } => request(Method::PUT, "/proxy".into()).json(&json!({ "target": url })),
        Commands::SetChangeOrigin { enabled } => {
            request(Method::PUT, "/proxy".into()).json(&json!({ "changeOrigin": enabled }))
        }
        Commands::Reload => request(Method::POST, "/reload".into()),
    };

    print_response(builder.send().await?).await
}

async fn print_response(res: reqwest::Response) -> anyhow::Result<()> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if !text.is_empty() {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    if text.is_empty() {
        println!("OK ({})", status);
        return Ok(());
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
