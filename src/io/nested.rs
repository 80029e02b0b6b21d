use super::TaxonomyLoader;
use crate::report::ReportSink;
use crate::taxonomy::Taxonomy;
use std::path::{Path, PathBuf};
use taxomerge_core::{TaxomergeError, TaxomergeResult};
use tracing::info;

/// Loads a file of `;`-separated nested trees, e.g. `((a,b)ab,c)top;`
#[derive(Debug, Clone)]
pub struct NestedLoader {
    path: PathBuf,
    tag: String,
}

impl NestedLoader {
    pub fn new(path: impl AsRef<Path>, tag: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            tag: tag.into(),
        }
    }
}

impl TaxonomyLoader for NestedLoader {
    fn load(&self, sink: &mut dyn ReportSink) -> TaxomergeResult<Taxonomy> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                TaxomergeError::NotFound(self.path.display().to_string())
            }
            _ => TaxomergeError::Io(e),
        })?;
        let taxonomy = Taxonomy::from_nested(self.tag.as_str(), text.trim())?;
        sink.count_n("loaded", taxonomy.len());
        info!(path = %self.path.display(), taxa = taxonomy.len(), "loaded nested taxonomy");
        Ok(taxonomy)
    }
}
