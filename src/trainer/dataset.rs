//! Rating and trust data loading.
//!
//! One entry per line: `source target [value]`, separated by whitespace or commas.
//! Blank lines and `#` comments are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use crate::prelude::*;
use crate::trainer::sparse_matrix::{Entry, SparseMatrix};

/// Maps raw identifiers onto dense indices in the first-seen order.
#[derive(Debug, Default, Clone)]
pub struct IdMap {
    indices: AHashMap<String, usize>,
    ids: Vec<String>,
}

impl IdMap {
    pub fn get_or_insert(&mut self, id: &str) -> usize {
        if let Some(index) = self.indices.get(id) {
            return *index;
        }
        let index = self.ids.len();
        self.indices.insert(id.to_string(), index);
        self.ids.push(id.to_string());
        index
    }

    pub fn get(&self, id: &str) -> Option<usize> {
        self.indices.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn into_ids(self) -> Vec<String> {
        self.ids
    }
}

impl From<Vec<String>> for IdMap {
    fn from(ids: Vec<String>) -> Self {
        let indices = ids
            .iter()
            .enumerate()
            .map(|(index, id)| (id.clone(), index))
            .collect();
        Self { indices, ids }
    }
}

pub struct Dataset {
    pub ratings: SparseMatrix,
    pub trust: SparseMatrix,
    pub users: IdMap,
    pub items: IdMap,
}

impl Dataset {
    #[instrument(skip_all, fields(ratings = %ratings_path.display(), trust = %trust_path.display()))]
    pub fn load(ratings_path: &Path, trust_path: &Path) -> Result<Self> {
        let start_instant = Instant::now();
        let ratings = File::open(ratings_path)
            .with_context(|| format!("failed to open `{}`", ratings_path.display()))?;
        let trust = File::open(trust_path)
            .with_context(|| format!("failed to open `{}`", trust_path.display()))?;
        let dataset = Self::read(BufReader::new(ratings), BufReader::new(trust))?;
        info!(
            n_users = dataset.users.len(),
            n_items = dataset.items.len(),
            n_ratings = dataset.ratings.len(),
            n_trust_edges = dataset.trust.n_nonzero(),
            elapsed = ?start_instant.elapsed(),
            "loaded",
        );
        Ok(dataset)
    }

    /// Rating users are indexed first, trust-only users follow.
    pub fn read(ratings: impl BufRead, trust: impl BufRead) -> Result<Self> {
        let mut users = IdMap::default();
        let mut items = IdMap::default();

        let mut rating_entries = Vec::new();
        for line in read_lines(ratings) {
            let (line_number, (user_id, item_id, value)) = line.context("failed to read the ratings")?;
            let value = value
                .ok_or_else(|| anyhow!("line {}: rating is missing", line_number))?;
            rating_entries.push(Entry::new(
                users.get_or_insert(&user_id),
                items.get_or_insert(&item_id),
                value,
            ));
        }
        ensure!(!rating_entries.is_empty(), "there are no ratings");

        let mut trust_entries = Vec::new();
        for line in read_lines(trust) {
            let (_, (trustor_id, trustee_id, value)) = line.context("failed to read the trust")?;
            trust_entries.push(Entry::new(
                users.get_or_insert(&trustor_id),
                users.get_or_insert(&trustee_id),
                value.unwrap_or(1.0),
            ));
        }

        let ratings = SparseMatrix::new(users.len(), items.len(), rating_entries)
            .context("invalid rating matrix")?;
        let trust =
            SparseMatrix::new(users.len(), users.len(), trust_entries).context("invalid trust matrix")?;
        Ok(Self {
            ratings,
            trust,
            users,
            items,
        })
    }
}

type Line = (String, String, Option<f64>);

/// Yields the non-empty lines with their 1-based numbers.
fn read_lines(reader: impl BufRead) -> impl Iterator<Item = Result<(usize, Line)>> {
    reader.lines().enumerate().filter_map(|(index, line)| {
        let line_number = index + 1;
        match line {
            Ok(line) => parse_line(&line)
                .with_context(|| format!("line {}: `{}`", line_number, line))
                .transpose()
                .map(|line| line.map(|line| (line_number, line))),
            Err(error) => Some(Err(error).context(format!("line {}", line_number))),
        }
    })
}

fn parse_line(line: &str) -> Result<Option<Line>> {
    let line = line.split_once('#').map_or(line, |(line, _)| line).trim();
    if line.is_empty() {
        return Ok(None);
    }
    let fields: Vec<&str> = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|field| !field.is_empty())
        .collect();
    match fields[..] {
        [source, target] => Ok(Some((source.to_string(), target.to_string(), None))),
        [source, target, value, ..] => {
            let value = f64::from_str(value).with_context(|| format!("invalid value `{}`", value))?;
            Ok(Some((source.to_string(), target.to_string(), Some(value))))
        }
        _ => Err(anyhow!("expected at least two fields")),
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    const RATINGS: &str = "\
        # user item rating\n\
        alice matrix 5\n\
        bob matrix 3\n\
        \n\
        bob,inception,4 # trailing comment\n\
    ";

    const TRUST: &str = "\
        alice bob\n\
        bob carol 0.5\n\
        carol alice 0\n\
    ";

    #[test]
    fn read_ok() -> Result {
        let dataset = Dataset::read(RATINGS.as_bytes(), TRUST.as_bytes())?;
        assert_eq!(dataset.users.clone().into_ids(), ["alice", "bob", "carol"]);
        assert_eq!(dataset.items.clone().into_ids(), ["matrix", "inception"]);
        assert_eq!(dataset.ratings.n_rows(), 3);
        assert_eq!(dataset.ratings.n_columns(), 2);

        let ratings = dataset
            .ratings
            .iter()
            .map(|entry| (entry.row, entry.column, entry.value))
            .collect_vec();
        assert_eq!(ratings, [(0, 0, 5.0), (1, 0, 3.0), (1, 1, 4.0)]);

        let trust = dataset
            .trust
            .iter()
            .map(|entry| (entry.row, entry.column, entry.value))
            .collect_vec();
        assert_eq!(trust, [(0, 1, 1.0), (1, 2, 0.5), (2, 0, 0.0)]);
        assert_eq!(dataset.trust.n_nonzero(), 2);
        Ok(())
    }

    #[test]
    fn missing_rating_fails() {
        let result = Dataset::read("alice matrix\n".as_bytes(), "".as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn malformed_line_is_reported_ok() {
        let error = Dataset::read("alice matrix 5\nbob matrix five\n".as_bytes(), "".as_bytes())
            .err()
            .map(|error| format!("{:#}", error))
            .unwrap_or_default();
        assert!(error.contains("line 2"), "{}", error);
    }

    #[test]
    fn empty_ratings_fail() {
        assert!(Dataset::read("# nothing\n".as_bytes(), "".as_bytes()).is_err());
    }

    #[test]
    fn duplicate_rating_fails() {
        assert!(Dataset::read("alice matrix 5\nalice matrix 4\n".as_bytes(), "".as_bytes()).is_err());
    }

    #[test]
    fn id_map_ok() {
        let mut map = IdMap::default();
        assert_eq!(map.get_or_insert("b"), 0);
        assert_eq!(map.get_or_insert("a"), 1);
        assert_eq!(map.get_or_insert("b"), 0);
        assert_eq!(map.get("a"), Some(1));
        assert_eq!(map.get("c"), None);

        let map = IdMap::from(map.into_ids());
        assert_eq!(map.get("b"), Some(0));
        assert_eq!(map.get("a"), Some(1));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn load_ok() -> Result {
        let directory = std::env::temp_dir().join(format!("sorec-dataset-{}", std::process::id()));
        std::fs::create_dir_all(&directory)?;
        let ratings_path = directory.join("ratings.txt");
        let trust_path = directory.join("trust.txt");
        std::fs::write(&ratings_path, RATINGS)?;
        std::fs::write(&trust_path, TRUST)?;

        let dataset = Dataset::load(&ratings_path, &trust_path)?;
        assert_eq!(dataset.ratings.len(), 3);
        assert!(Dataset::load(&directory.join("missing.txt"), &trust_path).is_err());

        std::fs::remove_dir_all(&directory)?;
        Ok(())
    }
}
