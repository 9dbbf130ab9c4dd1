use clap::{Parser, Subcommand};
use redirect_sdk::{RedirectClient, Resolution};

#[derive(Parser)]
#[command(name = "redirect-cli")]
#[command(about = "Management CLI for the redirect service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or overwrite a mapping
    Add {
        /// Short path, e.g. /docs
        path: String,
        /// Destination URL
        destination: String,
    },
    /// Print the mapping table as JSON
    List,
    /// Show where a path redirects without following it
    Resolve { path: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = RedirectClient::new(&cli.url)?;

    match cli.command {
        Commands::Add { path, destination } => {
            let confirmation = client.add(&path, &destination).await?;
            println!("{}", confirmation);
        }
        Commands::List => {
            let mappings = client.mappings().await?;
            println!("{}", serde_json::to_string_pretty(&mappings)?);
        }
        Commands::Resolve { path } => match client.resolve(&path).await? {
            Resolution::Redirect(location) => println!("{} -> {}", path, location),
            Resolution::NotFound => {
                eprintln!("{}: no mapping", path);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
