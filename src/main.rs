use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use skiff::plugins::{find_plugin, list_plugins};
use skiff::Config;

#[derive(Parser)]
#[command(name = "skiff", about = "Extensible CLI with executable subcommand plugins")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information
    Version,
    /// Manage CLI plugins
    Plugin {
        #[command(subcommand)]
        action: PluginCommands,
    },
}

#[derive(Subcommand)]
enum PluginCommands {
    /// List plugins found on the search path, including broken ones
    Ls,
    /// Show one plugin's record as JSON
    Inspect {
        /// Logical plugin name ("deploy" for skiff-deploy)
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let dirs = config.plugin_search_path();
    // The same tree clap parses from is what plugins are checked against.
    let root = Cli::command();

    match cli.command {
        Commands::Version => {
            println!("skiff version {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Plugin { action } => match action {
            PluginCommands::Ls => {
                let plugins = list_plugins(&dirs, &root, config.experimental).await?;
                if plugins.is_empty() {
                    println!("No plugins found");
                    return Ok(());
                }
                for plugin in plugins {
                    match &plugin.err {
                        Some(err) => println!("{:<20} (invalid: {})", plugin.name, err),
                        None => println!(
                            "{:<20} {:<16} {:<10} {}",
                            plugin.name, plugin.vendor, plugin.version, plugin.short_description
                        ),
                    }
                }
            }
            PluginCommands::Inspect { name } => {
                let plugin = find_plugin(&name, &dirs, &root, config.experimental).await?;
                println!("{}", serde_json::to_string_pretty(&plugin)?);
            }
        },
    }

    Ok(())
}
