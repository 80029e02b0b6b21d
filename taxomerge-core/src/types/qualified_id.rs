/// Qualified source references (`ncbi:9606`, `gbif:2436436`)
use crate::TaxomergeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a taxon's data came from: a source tag plus the id local to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedId {
    pub prefix: String,
    pub id: String,
}

impl QualifiedId {
    pub fn new(prefix: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            id: id.into(),
        }
    }

    /// Parse a comma separated `sourceinfo` column. Blank input is an empty list.
    pub fn parse_list(s: &str) -> Result<Vec<QualifiedId>, TaxomergeError> {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(QualifiedId::from_str)
            .collect()
    }

    pub fn render_list(ids: &[QualifiedId]) -> String {
        ids.iter()
            .map(|q| q.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for QualifiedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.prefix, self.id)
    }
}

impl FromStr for QualifiedId {
    type Err = TaxomergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // URLs keep their scheme as part of the id
        if s.starts_with("http://") || s.starts_with("https://") {
            return Ok(QualifiedId::new("url", s));
        }
        match s.split_once(':') {
            Some((prefix, id)) if !prefix.is_empty() && !id.is_empty() => {
                Ok(QualifiedId::new(prefix, id))
            }
            _ => Err(TaxomergeError::Parse(format!(
                "qualified id must look like prefix:id, got '{}'",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_qualified_id() {
        let qid: QualifiedId = "ncbi:9606".parse().unwrap();
        assert_eq!(qid, QualifiedId::new("ncbi", "9606"));
        assert_eq!(qid.to_string(), "ncbi:9606");

        let url: QualifiedId = "http://example.org/taxon/1".parse().unwrap();
        assert_eq!(url.prefix, "url");

        assert!("9606".parse::<QualifiedId>().is_err());
        assert!(":9606".parse::<QualifiedId>().is_err());
    }

    #[test]
    fn test_parse_list() {
        let ids = QualifiedId::parse_list("ncbi:9606, gbif:2436436,").unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(QualifiedId::render_list(&ids), "ncbi:9606,gbif:2436436");
        assert!(QualifiedId::parse_list("").unwrap().is_empty());
    }
}
