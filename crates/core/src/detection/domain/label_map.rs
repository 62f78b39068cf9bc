use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelMapError {
    #[error("failed to read label map {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("label map line {line}: expected `<id> <name>`, got {content:?}")]
    Malformed { line: usize, content: String },
}

/// Class index to human-readable name, e.g. `0  person`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelMap {
    names: HashMap<i64, String>,
}

impl LabelMap {
    pub fn from_file(path: &Path) -> Result<Self, LabelMapError> {
        let raw = fs::read_to_string(path).map_err(|e| LabelMapError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&raw)
    }

    /// One `<id><whitespace><name>` entry per line; blank lines are skipped
    /// and a repeated id keeps its last name.
    pub fn parse(raw: &str) -> Result<Self, LabelMapError> {
        let mut names = HashMap::new();
        for (idx, line) in raw.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let malformed = || LabelMapError::Malformed {
                line: idx + 1,
                content: line.to_string(),
            };
            let (id, name) = trimmed
                .split_once(char::is_whitespace)
                .ok_or_else(malformed)?;
            let id = id.parse::<i64>().map_err(|_| malformed())?;
            let name = name.trim();
            if name.is_empty() {
                return Err(malformed());
            }
            names.insert(id, name.to_string());
        }
        Ok(Self { names })
    }

    pub fn name(&self, id: i64) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(i64, S)> for LabelMap {
    fn from_iter<I: IntoIterator<Item = (i64, S)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(|(id, n)| (id, n.into())).collect(),
        }
    }
}
