//! Config command implementation.

use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::cli::{ConfigAction, OutputFormat};
use crate::config::{Config, Settings};
use crate::util::{Output, write_output};

pub fn cmd_config(
    action: ConfigAction,
    path: &Path,
    config: &Config,
    settings: &Settings,
    out: &Output,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let content = match out.format {
                OutputFormat::Json => out.opts.as_json(config)?,
                OutputFormat::Text => {
                    toml::to_string_pretty(config).context("Failed to serialize config")?
                }
            };
            write_output(out.path.as_ref(), &content)
        }
        ConfigAction::Path => write_output(out.path.as_ref(), &format!("{}\n", path.display())),
        ConfigAction::Init => {
            if path.exists() {
                bail!("Config file already exists: {}", path.display());
            }
            let config = Config {
                server: Some(settings.server.clone()),
                owner: settings.owner.clone(),
                upload_interval: Some(settings.upload_interval.as_secs()),
                sample_interval: Some(settings.sample_interval.as_secs()),
            };
            config.save_to(path)?;
            out.note(format!("Wrote {}", path.display()));
            Ok(())
        }
    }
}
