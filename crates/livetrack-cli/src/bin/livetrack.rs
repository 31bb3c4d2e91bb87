//! Push pilot records to a livetrack server and watch the live list.

use anyhow::Result;
use clap::{Parser, Subcommand};
use livetrack_cli::{describe, load_points, load_records, summarize, LOG_DIRECTIVES};
use livetrack_core::Pilot;
use livetrack_sdk::LivetrackClient;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Livetrack producer and viewer
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Livetrack server URL
    #[arg(long, env = "LIVETRACK_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Producer token for write calls
    #[arg(long, env = "LIVETRACK_PRODUCER_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace the pilot list with the records in a JSON file (`-` for stdin)
    Push { file: PathBuf },
    /// Insert or replace pilots by name from a JSON file (`-` for stdin)
    Upsert { file: PathBuf },
    /// Empty the pilot list
    Clear,
    /// Print the current pilot list
    List {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Follow the live pilot list
    Watch,
    /// Build a v1 pilot record from a JSON array of track points
    Summarize {
        points: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "#ff0000")]
        color: String,
        /// Upsert the record to the server instead of printing it
        #[arg(long)]
        push: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in LOG_DIRECTIVES {
        filter = filter.add_directive(directive.parse()?);
    }
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let args = Args::parse();
    let mut client = LivetrackClient::new(&args.url);
    client.set_producer_token(args.token.clone());

    match args.command {
        Command::Push { file } => {
            let records = load_records(&file)?;
            let count = client.set_pilots(&records).await?;
            println!("Stored {} pilots", count);
        }
        Command::Upsert { file } => {
            for record in load_records(&file)? {
                let pilot = client.upsert_pilot(&record).await?;
                println!("Upserted {}", pilot.name());
            }
        }
        Command::Clear => {
            client.clear().await?;
            println!("Pilot list cleared");
        }
        Command::List { json } => {
            let pilots = client.list_pilots().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&pilots)?);
            } else {
                print_pilots(&pilots);
            }
        }
        Command::Watch => {
            let schema = client.schema().await?;
            println!("Watching {} ({} records)...", args.url, schema);
            let mut stream = client.connect_stream().await?;
            while let Some(pilots) = stream.next_snapshot().await? {
                println!("--- {} ({} pilots)", chrono::Utc::now().format("%H:%M:%S"), pilots.len());
                print_pilots(&pilots);
            }
            tracing::info!("Stream closed by server");
        }
        Command::Summarize { points, name, color, push } => {
            let track = load_points(&points)?;
            let pilot = summarize(&name, &color, &track)?;
            if push {
                let stored = client.upsert_pilot(&serde_json::to_value(Pilot::V1(pilot))?).await?;
                println!("Upserted {}", stored.name());
            } else {
                println!("{}", serde_json::to_string_pretty(&pilot)?);
            }
        }
    }

    Ok(())
}

fn print_pilots(pilots: &[Pilot]) {
    if pilots.is_empty() {
        println!("(no pilots)");
    }
    for pilot in pilots {
        println!("{}", describe(pilot));
    }
}
