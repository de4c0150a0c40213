mod client;
mod config;
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};

use client::ApiClient;
use config::Config;

/// Envoy - command-line client for the Switchboard query router
#[derive(Parser, Debug)]
#[command(name = "envoy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Print raw JSON responses
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send a single query
    Ask {
        /// The question to route
        query: String,
    },

    /// Read queries from stdin until `quit`
    Chat,

    /// List the router's tools
    Tools,

    /// Show or change the saved configuration
    Config {
        /// Router base URL, e.g. http://localhost:8080
        #[arg(long)]
        server: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return Err(e);
        }
    };

    let client = ApiClient::new(config.server_url.clone());

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Ask { query } => ui::single_query(&client, &query, cli.json).await?,
        Commands::Chat => ui::interactive_chat(&client, cli.json).await?,
        Commands::Tools => ui::list_tools(&client, cli.json).await?,
        Commands::Config { server } => {
            if let Some(url) = server {
                config.set_server_url(&url)?;
                config.save()?;
                println!("Server URL updated to: {}", config.server_url);
            } else {
                println!("Current config:");
                println!("  Server URL: {}", config.server_url);
            }
        }
    }

    Ok(())
}
