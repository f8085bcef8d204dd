use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use torrent_tidy::{CliArgs, Config};

#[derive(Parser)]
#[command(name = "torrent-tidy")]
#[command(about = "Find orphaned files and hardlinked data behind a torrent client")]
struct Cli {
    #[arg(short, long, global = true, env = "TORRENT_TIDY_CONFIG", help = "Config file path")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Torrent snapshot JSON ({hash: torrent})")]
    torrents: Option<PathBuf>,

    #[arg(long, global = true, help = "Local download directory")]
    download_path: Option<PathBuf>,

    #[arg(long, global = true, help = "Report what would be removed without removing")]
    dry_run: bool,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase verbosity")]
    verbose: u8,

    #[arg(short, long, global = true, help = "Only log errors")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Remove files and folders in the download path that no torrent owns
    Orphan {
        #[arg(long, help = "Scan each category's save path against only that category's torrents")]
        use_category_paths: bool,
    },
    /// Show per-torrent uniqueness and hardlink facts
    Links,
}

impl Cli {
    fn log_level(&self) -> Option<String> {
        if self.quiet {
            return Some("error".to_string());
        }
        match self.verbose {
            0 => None,
            1 => Some("debug".to_string()),
            _ => Some("trace".to_string()),
        }
    }

    fn to_args(&self) -> CliArgs {
        CliArgs {
            config_file: self.config.clone(),
            torrents_file: self.torrents.clone(),
            download_path: self.download_path.clone(),
            dry_run: self.dry_run,
            use_category_paths: matches!(
                self.command,
                Command::Orphan {
                    use_category_paths: true
                }
            ),
            log_level: self.log_level(),
        }
    }
}

fn setup_logging(level: &str) -> Result<()> {
    let level = tracing::Level::from_str(level).unwrap_or(tracing::Level::INFO);
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(level >= tracing::Level::DEBUG)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_with_cli(&cli.to_args()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    setup_logging(&config.logging.level)?;

    match cli.command {
        Command::Orphan { .. } => {
            let report = torrent_tidy::run_orphan(config).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Links => {
            for line in torrent_tidy::run_links(config).await? {
                println!("{}", serde_json::to_string(&line)?);
            }
        }
    }

    Ok(())
}
