//! Reading and writing taxonomies.
//!
//! * [`TsvLoader`] / [`TsvDumper`] - the `taxonomy.tsv` + `synonyms.tsv`
//!   directory format, fields separated by `\t|\t`
//! * [`NestedLoader`] - a file of nested parenthesised trees

pub mod nested;
pub mod tsv;

pub use nested::NestedLoader;
pub use tsv::{TsvDumper, TsvLoader};

use crate::report::ReportSink;
use crate::taxonomy::Taxonomy;
use std::path::Path;
use taxomerge_core::TaxomergeResult;

/// Builds a taxonomy from some input.
///
/// Irregular rows are counted in the sink and skipped; only unreadable
/// input is an error.
pub trait TaxonomyLoader {
    fn load(&self, sink: &mut dyn ReportSink) -> TaxomergeResult<Taxonomy>;
}

/// Writes a taxonomy out
pub trait TaxonomyDumper {
    fn dump(&self, taxonomy: &Taxonomy) -> TaxomergeResult<()>;
}

/// Loader for a path: directories hold the TSV format, anything else is
/// read as nested notation.
pub fn loader_for(path: &Path, tag: &str) -> Box<dyn TaxonomyLoader> {
    if path.is_dir() {
        Box::new(TsvLoader::new(path, tag))
    } else {
        Box::new(NestedLoader::new(path, tag))
    }
}

/// Idspace tag for a path: the final component without extension
pub fn tag_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "source".to_string())
}
