use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use gpt_backup_core::StopOffset;
use tracing_subscriber::EnvFilter;

mod commands;
mod paths;
mod ui;

#[derive(Parser)]
#[command(name = "gpt-backup")]
#[command(about = "Back up your entire ChatGPT conversation history.")]
#[command(version)]
struct Cli {
    /// Log more detail to stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "GPT_BACKUP_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest conversations and write a JSON archive
    Backup(BackupArgs),

    /// Print the effective configuration
    Config,
}

#[derive(Args, Debug)]
pub struct BackupArgs {
    /// Listing offset to start from
    #[arg(long, default_value_t = 0)]
    pub start_offset: u64,

    /// Listing offset to stop before (-1 = fetch everything)
    #[arg(long, default_value = "-1", allow_negative_numbers = true)]
    pub stop_offset: StopOffset,

    /// Directory the archive is written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Bearer access token
    #[arg(long, env = "GPT_BACKUP_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Session cookie to exchange for an access token
    #[arg(long, env = "GPT_BACKUP_SESSION_COOKIE", hide_env_values = true)]
    pub session_cookie: Option<String>,

    /// Show a progress bar instead of protocol lines
    #[arg(long)]
    pub bar: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.into()))
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.unwrap_or_else(paths::default_config_path);

    match cli.command {
        Commands::Backup(args) => commands::backup::run(&config_path, args).await,
        Commands::Config => commands::config::run(&config_path),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_backup_defaults() {
        let cli = Cli::try_parse_from(["gpt-backup", "backup"]).unwrap();
        let Commands::Backup(args) = cli.command else {
            panic!("expected backup command");
        };
        assert_eq!(args.start_offset, 0);
        assert_eq!(args.stop_offset, StopOffset::Unbounded);
        assert!(!args.bar);
    }

    #[test]
    fn test_backup_offsets() {
        let cli = Cli::try_parse_from([
            "gpt-backup",
            "backup",
            "--start-offset",
            "20",
            "--stop-offset",
            "100",
        ])
        .unwrap();
        let Commands::Backup(args) = cli.command else {
            panic!("expected backup command");
        };
        assert_eq!(args.start_offset, 20);
        assert_eq!(args.stop_offset, StopOffset::At(100));

        let cli = Cli::try_parse_from(["gpt-backup", "backup", "--stop-offset", "-1"]).unwrap();
        let Commands::Backup(args) = cli.command else {
            panic!("expected backup command");
        };
        assert_eq!(args.stop_offset, StopOffset::Unbounded);
    }

    #[test]
    fn test_rejects_negative_offsets() {
        assert!(Cli::try_parse_from(["gpt-backup", "backup", "--stop-offset", "-2"]).is_err());
        assert!(Cli::try_parse_from(["gpt-backup", "backup", "--start-offset", "-1"]).is_err());
    }
}
