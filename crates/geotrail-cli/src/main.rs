use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod format;
mod sources;
mod util;

use cli::{Cli, Commands};
use commands::{
    TrackArgs, cmd_config, cmd_delete, cmd_fetch, cmd_history, cmd_locate, cmd_track, cmd_upload,
};
use config::{Config, Settings};
use format::FormatOptions;
use util::Output;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for JSON output
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(Config::path);
    let config = Config::load(Some(config_path.as_path()));
    let settings = Settings::resolve(cli.server.clone(), cli.owner.clone(), &config);

    let no_color = cli.no_color || cli.output.is_some() || !io::stdout().is_terminal();
    let out = Output {
        format: cli.format,
        opts: FormatOptions::new(no_color, cli.compact),
        path: cli.output.clone(),
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Track {
            replay,
            interval,
            upload_every,
            duration,
            date,
            lat,
            lng,
        } => {
            cmd_track(TrackArgs {
                replay,
                interval,
                upload_every,
                duration,
                date,
                origin: (lat, lng),
                settings: &settings,
                out: &out,
            })
            .await?;
        }
        Commands::Upload { file, date } => {
            cmd_upload(&settings, &file, date, &out).await?;
        }
        Commands::Fetch { date } => {
            cmd_fetch(&settings, date, &out).await?;
        }
        Commands::History { limit } => {
            cmd_history(&settings, limit, &out).await?;
        }
        Commands::Delete { date } => {
            cmd_delete(&settings, date, &out).await?;
        }
        Commands::Locate { lat, lng } => {
            cmd_locate(&settings, lat.zip(lng), &out).await?;
        }
        Commands::Config { action } => {
            cmd_config(action, &config_path, &config, &settings, &out)?;
        }
    }

    Ok(())
}
