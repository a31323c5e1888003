use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Install a compact stderr subscriber; `RUST_LOG` directives layer on top of `filter`.
pub fn init_tracing(filter: Option<String>) -> Result<()> {
    let env_filter = build_filter(filter)?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
    Ok(())
}

/// Same as [`init_tracing`] but appends plain lines to `path`, for the dashboard where
/// stderr shares the terminal with the alternate screen.
pub fn init_file_tracing(filter: Option<String>, path: &Path) -> Result<()> {
    let env_filter = build_filter(filter)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .compact()
        .try_init();
    Ok(())
}

fn build_filter(filter: Option<String>) -> Result<EnvFilter> {
    let filter = filter.unwrap_or_else(|| DEFAULT_DIRECTIVE.to_string());
    let directive: Directive = filter.parse()?;
    Ok(EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy())
}
