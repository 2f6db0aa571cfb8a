//! Posterforge CLI - submit poster jobs and follow their progress.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8640";
const WATCH_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "posterforge")]
#[command(about = "Posterforge CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "POSTERFORGE_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a new poster job
    Submit {
        /// City to render (e.g. "Tokyo")
        #[arg(short, long)]
        city: String,

        /// Optional state or region, for more precise geocoding
        #[arg(long)]
        state: Option<String>,

        /// Country (e.g. "Japan")
        #[arg(long)]
        country: String,

        /// Theme id
        #[arg(short, long, default_value = "feature_based")]
        theme: String,

        /// Size preset (e.g. city, metro); "auto" lets the server decide
        #[arg(long)]
        size: Option<String>,

        /// Render radius in meters (1000-50000), instead of a size preset
        #[arg(long)]
        distance: Option<u32>,

        /// Keep this poster out of the public gallery
        #[arg(long)]
        private: bool,

        /// Poll until the job finishes
        #[arg(short, long)]
        watch: bool,
    },

    /// Show a job's current status
    Status {
        /// Job ID
        job_id: String,
    },

    /// Poll a job until it completes or fails
    Watch {
        /// Job ID
        job_id: String,
    },

    /// List recent gallery posters
    Gallery {
        /// Maximum number of entries
        #[arg(short, long, default_value = "12")]
        limit: usize,
    },

    /// List available themes
    Themes,

    /// Show service statistics
    Stats,
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize)]
struct CreateResult {
    job_id: String,
    status: String,
    message: String,
}

#[derive(Deserialize)]
struct JobStatusResult {
    job_id: String,
    status: String,
    progress: u32,
    message: Option<String>,
    error: Option<String>,
    download_url: Option<String>,
}

#[derive(Deserialize, Tabled)]
struct GalleryRow {
    #[tabled(rename = "City")]
    city: String,
    #[tabled(rename = "Country")]
    country: String,
    #[tabled(rename = "Theme")]
    theme_name: String,
    #[tabled(rename = "Job")]
    job_id: String,
}

#[derive(Deserialize, Tabled)]
struct ThemeRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Background")]
    bg: String,
    #[tabled(rename = "Text")]
    text: String,
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

fn print_status(status: &JobStatusResult) {
    let label = match status.status.as_str() {
        "completed" => status.status.green().bold(),
        "failed" => status.status.red().bold(),
        "processing" => status.status.yellow(),
        _ => status.status.normal(),
    };
    print!("{} [{:>3}%] {}", label, status.progress, status.job_id);
    if let Some(message) = &status.message {
        print!(" - {}", message);
    }
    println!();
    if let Some(error) = &status.error {
        println!("  {} {}", "error:".red(), error);
    }
    if let Some(url) = &status.download_url {
        println!("  {} {}", "download:".green(), url);
    }
}

async fn fetch_status(rpc_url: &str, job_id: &str) -> Result<JobStatusResult> {
    let result = call_rpc(rpc_url, "job.status.v1", json!({ "job_id": job_id })).await?;
    serde_json::from_value(result).context("Malformed job.status.v1 result")
}

async fn watch_job(rpc_url: &str, job_id: &str) -> Result<()> {
    loop {
        let status = fetch_status(rpc_url, job_id).await?;
        print_status(&status);
        if status.status == "completed" || status.status == "failed" {
            break;
        }
        tokio::time::sleep(WATCH_POLL_INTERVAL).await;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Submit {
            city,
            state,
            country,
            theme,
            size,
            distance,
            private,
            watch,
        } => {
            let mut params = json!({
                "city": city,
                "country": country,
                "theme": theme,
                "show_in_gallery": !private,
            });
            if let Some(state) = state {
                params["state"] = json!(state);
            }
            if let Some(size) = size {
                params["size"] = json!(size);
            }
            if let Some(distance) = distance {
                params["distance"] = json!(distance);
            }

            let result = call_rpc(&cli.rpc_url, "poster.create.v1", params).await?;
            let created: CreateResult =
                serde_json::from_value(result).context("Malformed poster.create.v1 result")?;

            println!(
                "{} job {} ({})",
                "submitted".green().bold(),
                created.job_id,
                created.status
            );
            println!("  {}", created.message);

            if watch {
                watch_job(&cli.rpc_url, &created.job_id).await?;
            }
        }

        Commands::Status { job_id } => {
            let status = fetch_status(&cli.rpc_url, &job_id).await?;
            print_status(&status);
        }

        Commands::Watch { job_id } => {
            watch_job(&cli.rpc_url, &job_id).await?;
        }

        Commands::Gallery { limit } => {
            let result =
                call_rpc(&cli.rpc_url, "gallery.recent.v1", json!({ "limit": limit })).await?;
            let rows: Vec<GalleryRow> = serde_json::from_value(result["posters"].clone())
                .context("Malformed gallery.recent.v1 result")?;
            if rows.is_empty() {
                println!("Gallery is empty.");
            } else {
                println!("{}", Table::new(rows));
            }
        }

        Commands::Themes => {
            let result = call_rpc(&cli.rpc_url, "theme.list.v1", json!({})).await?;
            let rows: Vec<ThemeRow> = serde_json::from_value(result["themes"].clone())
                .context("Malformed theme.list.v1 result")?;
            println!("{}", Table::new(rows));
        }

        Commands::Stats => {
            let result = call_rpc(&cli.rpc_url, "admin.stats.v1", json!({})).await?;
            println!("{}", "Posterforge stats".bold());
            println!("  total:      {}", result["total_jobs"]);
            println!("  pending:    {}", result["pending_jobs"]);
            println!("  processing: {}", result["processing_jobs"]);
            println!("  completed:  {}", result["completed_jobs"]);
            println!("  failed:     {}", result["failed_jobs"]);
            println!("  uptime:     {}s", result["uptime_seconds"]);
        }
    }

    Ok(())
}
