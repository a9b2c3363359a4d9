//! # pdes-cli::logging
//!
//! Initializes the tracing subscriber from the diagnostic flags:
//! `--verbose` raises the base level, `--debug` promotes individual
//! targets to trace, and `--debug-file` redirects output to a file.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool, debug: &[String], debug_file: Option<&Path>) -> Result<()> {
    let base = if verbose { "debug" } else { "info" };
    let mut filter = EnvFilter::try_new(base)?;
    for target in debug {
        let directive = format!("{target}=trace")
            .parse()
            .with_context(|| format!("bad --debug category '{target}'"))?;
        filter = filter.add_directive(directive);
    }

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match debug_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot open debug file {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).with_ansi(false).init();
        }
        None => builder.init(),
    }
    Ok(())
}
