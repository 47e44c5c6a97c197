use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Command line client for a running swapi-gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3001")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every stored log file
    Logs,
    /// File an error report
    Report {
        #[arg(short, long)]
        context: String,
        #[arg(short, long)]
        error: String,
    },
    /// Fetch an upstream path through the gateway (e.g. /people/1/)
    Get { path: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Logs => {
            let res = client.get(format!("{}/get-logs", base)).send().await?;
            let status = res.status();
            if !status.is_success() {
                eprintln!("Error: gateway returned status {}", status);
                eprintln!("Response: {}", res.text().await.unwrap_or_default());
                return Ok(());
            }
            let logs: serde_json::Map<String, Value> = res.json().await?;
            if logs.is_empty() {
                println!("No log files.");
            }
            for (file, content) in logs {
                println!("=== {} ===", file);
                println!("{}", content.as_str().unwrap_or_default());
            }
        }
        Commands::Report { context, error } => {
            let timestamp = chrono::Local::now().to_rfc3339();
            let res = client
                .post(format!("{}/log-error", base))
                .json(&json!({ "error": error, "context": context, "timestamp": timestamp }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Get { path } => {
            let path = if path.starts_with('/') { path } else { format!("/{}", path) };
            let res = client.get(format!("{}{}", base, path)).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
