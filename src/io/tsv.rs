//! The `taxonomy.tsv` directory format.
//!
//! ```text
//! uid	|	parent_uid	|	name	|	rank	|	sourceinfo	|	uniqname	|	flags	|
//! 9606	|	9605	|	Homo sapiens	|	species	|	ncbi:9606	|		|		|
//! ```
//!
//! An optional `synonyms.tsv` alongside holds `name | uid | type |` rows.

use super::{TaxonomyDumper, TaxonomyLoader};
use crate::report::{EventKind, ReportSink};
use crate::taxonomy::{Node, Taxonomy};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use taxomerge_core::{Flags, QualifiedId, Rank, TaxomergeError, TaxomergeResult};
use tracing::{info, warn};

pub const TAXONOMY_FILE: &str = "taxonomy.tsv";
pub const SYNONYMS_FILE: &str = "synonyms.tsv";

const SEP: &str = "\t|\t";
const TAXONOMY_HEADER: [&str; 7] = [
    "uid",
    "parent_uid",
    "name",
    "rank",
    "sourceinfo",
    "uniqname",
    "flags",
];
const SYNONYMS_HEADER: [&str; 3] = ["name", "uid", "type"];

/// Split one row into fields, dropping the trailing `\t|`
fn fields(line: &str) -> Vec<&str> {
    let line = line.trim_end_matches(['\r', '\n']);
    let line = line.strip_suffix("\t|").unwrap_or(line);
    line.split(SEP).collect()
}

fn row(fields: &[&str]) -> String {
    let mut line = fields.join(SEP);
    line.push_str("\t|");
    line
}

fn open(path: &Path) -> TaxomergeResult<BufReader<File>> {
    match File::open(path) {
        Ok(file) => Ok(BufReader::new(file)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(TaxomergeError::NotFound(path.display().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Count a skipped irregularity and log it
fn irregular(sink: &mut dyn ReportSink, tag: &str, message: String) {
    warn!("{}", message);
    sink.count(tag);
    sink.event(EventKind::DataQuality, message);
}

/// Loads a taxonomy directory
#[derive(Debug, Clone)]
pub struct TsvLoader {
    dir: PathBuf,
    tag: String,
}

impl TsvLoader {
    pub fn new(dir: impl AsRef<Path>, tag: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            tag: tag.into(),
        }
    }

    fn load_taxa(
        &self,
        taxonomy: &mut Taxonomy,
        sink: &mut dyn ReportSink,
    ) -> TaxomergeResult<Vec<(Node, String)>> {
        let path = self.dir.join(TAXONOMY_FILE);
        let mut parents = Vec::new();

        for (i, line) in open(&path)?.lines().enumerate() {
            let line = line?;
            let lineno = i + 1;
            if line.trim().is_empty() {
                continue;
            }
            let f = fields(&line);
            if i == 0 && f.first() == Some(&"uid") {
                continue;
            }
            if f.len() < 3 || f[0].trim().is_empty() {
                irregular(
                    sink,
                    "malformed-row",
                    format!("{}:{}: malformed row", path.display(), lineno),
                );
                continue;
            }

            let uid = f[0].trim();
            let name = Some(f[2]).filter(|n| !n.is_empty());
            let raw_rank = f.get(3).copied().unwrap_or("").trim();
            let rank = Rank::parse(raw_rank);
            if !raw_rank.is_empty() && !rank.is_ranked() && raw_rank != Rank::NoRank.as_str() {
                irregular(
                    sink,
                    "unknown-rank",
                    format!("{}:{}: unknown rank '{}'", path.display(), lineno, raw_rank),
                );
            }

            let node = match taxonomy.new_taxon(name, rank, Some(uid)) {
                Ok(node) => node,
                Err(_) => {
                    irregular(
                        sink,
                        "duplicate-id",
                        format!("{}:{}: duplicate id {}", path.display(), lineno, uid),
                    );
                    continue;
                }
            };

            match QualifiedId::parse_list(f.get(4).copied().unwrap_or("")) {
                Ok(sources) => {
                    for qid in sources {
                        taxonomy.add_source_ref(node, qid)?;
                    }
                }
                Err(e) => irregular(
                    sink,
                    "bad-sourceinfo",
                    format!("{}:{}: {}", path.display(), lineno, e),
                ),
            }

            // inherited flags are recomputed once the tree is built
            let (proper, _, unknown) = Flags::parse(f.get(6).copied().unwrap_or(""));
            taxonomy.set_proper_flags(node, proper)?;
            for token in unknown {
                irregular(
                    sink,
                    "unknown-flag",
                    format!("{}:{}: unknown flag '{}'", path.display(), lineno, token),
                );
            }

            parents.push((node, f[1].trim().to_string()));
        }
        Ok(parents)
    }

    fn link(
        &self,
        taxonomy: &mut Taxonomy,
        parents: Vec<(Node, String)>,
        sink: &mut dyn ReportSink,
    ) -> TaxomergeResult<()> {
        let mut detached = Vec::new();
        for (node, parent_id) in parents {
            if parent_id.is_empty() || taxonomy[node].id() == Some(parent_id.as_str()) {
                detached.push(node);
                continue;
            }
            let Some(parent) = taxonomy.by_id(&parent_id) else {
                irregular(
                    sink,
                    "orphan",
                    format!(
                        "{} has unknown parent {}; made a root",
                        taxonomy.label(node),
                        parent_id
                    ),
                );
                detached.push(node);
                continue;
            };
            if let Err(e) = taxonomy.attach(node, parent) {
                irregular(sink, "cycle", format!("{}; made a root", e));
                detached.push(node);
            }
        }
        for node in detached {
            taxonomy.add_root(node)?;
        }
        Ok(())
    }

    fn load_synonyms(&self, taxonomy: &mut Taxonomy, sink: &mut dyn ReportSink) -> TaxomergeResult<usize> {
        let path = self.dir.join(SYNONYMS_FILE);
        if !path.exists() {
            return Ok(0);
        }
        let mut added = 0;
        for (i, line) in open(&path)?.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let f = fields(&line);
            if i == 0 && f.first() == Some(&"name") {
                continue;
            }
            if f.len() < 2 || f[0].is_empty() {
                irregular(
                    sink,
                    "malformed-synonym",
                    format!("{}:{}: malformed row", path.display(), i + 1),
                );
                continue;
            }
            match taxonomy.by_id(f[1].trim()) {
                Some(node) => {
                    if taxonomy.add_synonym(node, f[0])? {
                        added += 1;
                    }
                }
                None => irregular(
                    sink,
                    "orphan-synonym",
                    format!("synonym '{}' names unknown id {}", f[0], f[1].trim()),
                ),
            }
        }
        Ok(added)
    }
}

impl TaxonomyLoader for TsvLoader {
    fn load(&self, sink: &mut dyn ReportSink) -> TaxomergeResult<Taxonomy> {
        let mut taxonomy = Taxonomy::new(self.tag.as_str());
        let parents = self.load_taxa(&mut taxonomy, sink)?;
        self.link(&mut taxonomy, parents, sink)?;
        let synonyms = self.load_synonyms(&mut taxonomy, sink)?;
        taxonomy.infer_flags();

        sink.count_n("loaded", taxonomy.len());
        info!(
            dir = %self.dir.display(),
            taxa = taxonomy.len(),
            roots = taxonomy.roots().len(),
            synonyms,
            "loaded taxonomy"
        );
        Ok(taxonomy)
    }
}

/// Writes a taxonomy directory. Taxa without an id get `~index`.
#[derive(Debug, Clone)]
pub struct TsvDumper {
    dir: PathBuf,
}

impl TsvDumper {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

fn uid(taxonomy: &Taxonomy, node: Node) -> String {
    match taxonomy[node].id() {
        Some(id) => id.to_string(),
        None => format!("~{}", node.index()),
    }
}

impl TaxonomyDumper for TsvDumper {
    fn dump(&self, taxonomy: &Taxonomy) -> TaxomergeResult<()> {
        std::fs::create_dir_all(&self.dir)?;

        let mut out = BufWriter::new(File::create(self.dir.join(TAXONOMY_FILE))?);
        writeln!(out, "{}", row(&TAXONOMY_HEADER))?;
        for node in taxonomy.walk() {
            let taxon = &taxonomy[node];
            let parent = taxonomy
                .parent(node)
                .map(|p| uid(taxonomy, p))
                .unwrap_or_default();
            let unique = taxonomy.unique_name(node);
            let unique = if taxon.name() == Some(unique.as_str()) {
                String::new()
            } else {
                unique
            };
            let id = uid(taxonomy, node);
            let sources = QualifiedId::render_list(taxon.sources());
            let flags = Flags::render(taxon.proper_flags(), taxon.inherited_flags());
            writeln!(
                out,
                "{}",
                row(&[
                    id.as_str(),
                    parent.as_str(),
                    taxon.name().unwrap_or(""),
                    taxon.rank().as_str(),
                    sources.as_str(),
                    unique.as_str(),
                    flags.as_str(),
                ])
            )?;
        }
        out.flush()?;

        let mut out = BufWriter::new(File::create(self.dir.join(SYNONYMS_FILE))?);
        writeln!(out, "{}", row(&SYNONYMS_HEADER))?;
        let mut synonyms = 0usize;
        for node in taxonomy.walk() {
            let id = uid(taxonomy, node);
            for name in taxonomy[node].synonyms() {
                writeln!(out, "{}", row(&[name.as_str(), id.as_str(), "synonym"]))?;
                synonyms += 1;
            }
        }
        out.flush()?;

        info!(dir = %self.dir.display(), taxa = taxonomy.len(), synonyms, "wrote taxonomy");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Report;
    use pretty_assertions::assert_eq;
    use taxomerge_core::Flag;
    use tempfile::TempDir;

    fn write(dir: &Path, file: &str, rows: &[&str]) {
        std::fs::write(dir.join(file), rows.join("\n") + "\n").unwrap();
    }

    #[test]
    fn test_load_counts_irregular_rows() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            TAXONOMY_FILE,
            &[
                "uid\t|\tparent_uid\t|\tname\t|\trank\t|\tsourceinfo\t|\tuniqname\t|\tflags\t|",
                "1\t|\t\t|\tlife\t|\tno rank\t|\t\t|\t\t|\t\t|",
                "2\t|\t1\t|\tMetazoa\t|\tkingdom\t|\tncbi:33208\t|\t\t|\t\t|",
                "3\t|\t2\t|\tDodo\t|\tgenus\t|\t\t|\t\t|\textinct\t|",
                "4\t|\t99\t|\tLost\t|\tspecies\t|\t\t|\t\t|\t\t|",
                "2\t|\t1\t|\tAgain\t|\t\t|\t\t|\t\t|\t\t|",
                "garbage",
            ],
        );
        write(
            dir.path(),
            SYNONYMS_FILE,
            &["name\t|\tuid\t|\ttype\t|", "Animalia\t|\t2\t|\tsynonym\t|", "Ghost\t|\t77\t|\tsynonym\t|"],
        );

        let mut report = Report::new("load");
        let tax = TsvLoader::new(dir.path(), "t").load(&mut report).unwrap();

        assert_eq!(tax.len(), 4);
        assert_eq!(tax.roots().len(), 2);
        assert_eq!(report.get("orphan"), 1);
        assert_eq!(report.get("duplicate-id"), 1);
        assert_eq!(report.get("malformed-row"), 1);
        assert_eq!(report.get("orphan-synonym"), 1);

        let metazoa = tax.by_id("2").unwrap();
        assert_eq!(tax.lookup("Animalia"), &[metazoa]);
        assert_eq!(tax[metazoa].sources(), &[QualifiedId::new("ncbi", "33208")]);
        let dodo = tax.by_id("3").unwrap();
        assert!(tax[dodo].has_flag(Flag::Extinct));
        assert_eq!(tax.parent(dodo), Some(metazoa));
    }

    #[test]
    fn test_dump_then_load_preserves_tree() {
        let mut tax = Taxonomy::from_nested("t", "((a,b)ab,(c)cd)top").unwrap();
        let ab = tax.lookup_unique("ab").unwrap();
        tax.add_synonym(ab, "AB").unwrap();
        tax.set_rank(ab, Rank::Genus).unwrap();
        tax.add_flag(ab, Flag::Hidden).unwrap();
        tax.infer_flags();

        let dir = TempDir::new().unwrap();
        TsvDumper::new(dir.path()).dump(&tax).unwrap();
        let mut report = Report::new("load");
        let back = TsvLoader::new(dir.path(), "t").load(&mut report).unwrap();

        assert_eq!(back.len(), tax.len());
        assert_eq!(report.get("orphan"), 0);
        let back_ab = back.lookup_primary("ab").next().unwrap();
        assert_eq!(back[back_ab].rank(), Rank::Genus);
        assert_eq!(back[back_ab].synonyms(), &["AB".to_string()]);
        assert!(back[back_ab].has_flag(Flag::Hidden));
        let a = back.lookup_unique("a").unwrap();
        assert_eq!(back.parent(a), Some(back_ab));
        assert_eq!(back[a].id(), Some(format!("~{}", tax.lookup_unique("a").unwrap().index()).as_str()));
    }

    #[test]
    fn test_missing_directory_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = TsvLoader::new(dir.path().join("nope"), "t")
            .load(&mut Report::new("load"))
            .unwrap_err();
        assert!(matches!(err, TaxomergeError::NotFound(_)));
    }
}
