//! Utility functions for CLI operations.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use geotrail_core::{ClientConfig, RouteClient};

use crate::cli::OutputFormat;
use crate::format::FormatOptions;

/// How command results are rendered and where they go.
#[derive(Debug, Clone)]
pub struct Output {
    pub format: OutputFormat,
    pub opts: FormatOptions,
    pub path: Option<PathBuf>,
    pub quiet: bool,
}

impl Output {
    /// Render `value` as JSON, or with `text` in text mode, and write it out.
    pub fn emit<T, F>(&self, value: &T, text: F) -> Result<()>
    where
        T: serde::Serialize,
        F: FnOnce(&T, &FormatOptions) -> String,
    {
        let content = match self.format {
            OutputFormat::Json => self.opts.as_json(value)?,
            OutputFormat::Text => text(value, &self.opts),
        };
        write_output(self.path.as_ref(), &content)
    }

    /// Print a progress note to stderr unless quiet or producing JSON.
    pub fn note(&self, message: impl std::fmt::Display) {
        if !self.quiet && self.format == OutputFormat::Text {
            eprintln!("{}", message);
        }
    }
}

/// Build a client for the configured service.
pub fn connect(server: &str) -> Result<RouteClient> {
    let config = ClientConfig::new(server).timeout(Duration::from_secs(10));
    RouteClient::with_config(&config).with_context(|| format!("Invalid server URL '{}'", server))
}

/// Write output to file or stdout.
pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_validates_url() {
        assert!(connect("http://localhost:8000").is_ok());
        let err = connect("localhost:8000").unwrap_err();
        assert!(err.to_string().contains("Invalid server URL"));
    }

    #[test]
    fn test_emit_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let output = Output {
            format: OutputFormat::Json,
            opts: FormatOptions::new(true, true),
            path: Some(path.clone()),
            quiet: true,
        };

        output.emit(&vec![1, 2, 3], |_, _| String::new()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1,2,3]\n");

        let output = Output {
            format: OutputFormat::Text,
            ..output
        };
        output
            .emit(&vec![1], |v, _| format!("{} item\n", v.len()))
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1 item\n");
    }
}
