pub mod conflict;
pub mod merge;

use crate::io;
use crate::report::ReportSink;
use crate::taxonomy::Taxonomy;
use anyhow::Context;
use std::path::Path;
use taxomerge_core::{default_config, load_config, Config};

/// Configuration from `--config`, or the defaults
pub fn resolve_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(default_config()),
    }
}

/// Load a taxonomy from a TSV directory or a nested-notation file
pub fn load_taxonomy(path: &Path, sink: &mut dyn ReportSink) -> anyhow::Result<Taxonomy> {
    let tag = io::tag_for(path);
    io::loader_for(path, &tag)
        .load(sink)
        .with_context(|| format!("Failed to load taxonomy from {}", path.display()))
}
