//! Merging and comparing biological classification trees.
//!
//! A [`UnionTaxonomy`] absorbs source taxonomies in priority order: each
//! source is aligned against the union ([`Alignment`]) and then merged
//! ([`merge::merge`]), grafting new groupings, inserting resolutions and
//! recording conflicts. [`ConflictAnalysis`] classifies every grouping of
//! one tree against another without changing either.

pub mod alignment;
pub mod cli;
pub mod conflict;
pub mod io;
pub mod merge;
pub mod report;
pub mod taxonomy;

pub use crate::alignment::{Alignment, Answer, Correspondence, Grade};
pub use crate::conflict::{ConflictAnalysis, Disposition, TipCorrespondence};
pub use crate::merge::{MergeOutcome, UnionTaxonomy};
pub use crate::report::{ConflictRecord, Report, ReportSink};
pub use crate::taxonomy::{Node, Taxonomy};

pub use taxomerge_core::{
    default_config, load_config, save_config, Config, Flag, Flags, QualifiedId, Rank,
    StructureError, TaxomergeError, TaxomergeResult,
};

pub type Result<T> = TaxomergeResult<T>;
