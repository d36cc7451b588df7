mod commands;
mod utils;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "azflow")]
#[command(about = "Declarative management of Azure Analysis Services servers", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Project directory holding `.azflow/state.json` (default: current directory)
    #[arg(short = 'C', long, env = "AZFLOW_PROJECT_DIR", global = true)]
    project_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update the server described by a YAML file
    Apply {
        /// Server definition (YAML)
        file: PathBuf,
    },
    /// Refresh a server's recorded state from Azure
    Refresh {
        /// Server name
        name: String,
    },
    /// Delete a server and forget it
    Destroy {
        /// Server name
        name: String,
        /// Run without confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Show recorded servers
    Show {
        /// Server name (all servers when omitted)
        name: Option<String>,
    },
    /// Verify Azure credentials
    Auth,
    /// Show version information
    Version,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let project_root = utils::project_root(cli.project_dir)?;

    let result = match cli.command {
        Commands::Apply { file } => commands::apply::handle(&project_root, &file).await,
        Commands::Refresh { name } => commands::refresh::handle(&project_root, &name).await,
        Commands::Destroy { name, yes } => {
            commands::destroy::handle(&project_root, &name, yes).await
        }
        Commands::Show { name } => commands::show::handle(&project_root, name.as_deref()).await,
        Commands::Auth => commands::auth::handle(&project_root).await,
        Commands::Version => {
            println!("azflow {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!();
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}
