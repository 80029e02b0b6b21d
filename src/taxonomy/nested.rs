//! Compact nested-parenthesis notation, e.g. `((a,b)ab,(c,d)cd)top`.
//!
//! Each tree is a name optionally preceded by a parenthesised,
//! comma-separated list of children. Several trees are separated by `;`.
//! Empty names make nameless taxa only after a closing parenthesis; empty
//! list elements are skipped. There is no quoting and no branch lengths.

use super::{Node, Taxonomy};
use taxomerge_core::{Rank, TaxomergeError, TaxomergeResult};

impl Taxonomy {
    /// Build a taxonomy from nested notation
    pub fn from_nested(tag: impl Into<String>, text: &str) -> TaxomergeResult<Taxonomy> {
        let mut taxonomy = Taxonomy::new(tag);
        taxonomy.extend_nested(text)?;
        Ok(taxonomy)
    }

    /// Add the trees written in nested notation as new roots
    pub fn extend_nested(&mut self, text: &str) -> TaxomergeResult<Vec<Node>> {
        let mut parser = NestedParser {
            taxonomy: self,
            open: Vec::new(),
            closed: None,
            token: String::new(),
            roots: Vec::new(),
        };

        for (pos, ch) in text.chars().enumerate() {
            match ch {
                '(' => {
                    if parser.closed.is_some() || !parser.token.trim().is_empty() {
                        return Err(parse_error(pos, "unexpected '('"));
                    }
                    let node = parser.create(None)?;
                    parser.open.push(node);
                }
                ',' => {
                    if parser.open.is_empty() {
                        return Err(parse_error(pos, "',' outside parentheses"));
                    }
                    parser.flush()?;
                }
                ')' => {
                    parser.flush()?;
                    let node = parser
                        .open
                        .pop()
                        .ok_or_else(|| parse_error(pos, "unbalanced ')'"))?;
                    parser.closed = Some(node);
                }
                ';' => {
                    if !parser.open.is_empty() {
                        return Err(parse_error(pos, "';' inside parentheses"));
                    }
                    parser.flush()?;
                }
                _ => parser.token.push(ch),
            }
        }
        if !parser.open.is_empty() {
            return Err(TaxomergeError::Parse(format!(
                "{} unclosed '(' in nested taxonomy",
                parser.open.len()
            )));
        }
        parser.flush()?;
        Ok(parser.roots)
    }
}

struct NestedParser<'a> {
    taxonomy: &'a mut Taxonomy,
    /// Internal nodes whose child list is still open
    open: Vec<Node>,
    /// Node just closed by ')', waiting for its name
    closed: Option<Node>,
    token: String,
    roots: Vec<Node>,
}

impl NestedParser<'_> {
    fn create(&mut self, name: Option<&str>) -> TaxomergeResult<Node> {
        let node = self.taxonomy.new_taxon(name, Rank::NoRank, None)?;
        match self.open.last() {
            Some(&parent) => self.taxonomy.attach(node, parent)?,
            None => {
                self.taxonomy.add_root(node)?;
                self.roots.push(node);
            }
        }
        Ok(node)
    }

    /// End of an element: name the closed node or create a leaf
    fn flush(&mut self) -> TaxomergeResult<()> {
        let token = std::mem::take(&mut self.token);
        let name = token.trim();
        match self.closed.take() {
            Some(node) if !name.is_empty() => self.taxonomy.set_name(node, Some(name))?,
            Some(_) => {}
            None if !name.is_empty() => {
                self.create(Some(name))?;
            }
            None => {}
        }
        Ok(())
    }
}

fn parse_error(pos: usize, what: &str) -> TaxomergeError {
    TaxomergeError::Parse(format!("{} at offset {} in nested taxonomy", what, pos))
}
