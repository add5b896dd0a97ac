//! Keyword and regex search over a [`SearchIndex`]
//!
//! Scores are distances: lower is better, 0 is a perfect match.
//!
//! | match                          | score                          |
//! |--------------------------------|--------------------------------|
//! | empty keyword, any regex match | 0                              |
//! | exact name (case-insensitive)  | 0                              |
//! | name starts with keyword       | 1                              |
//! | name contains keyword          | 2                              |
//! | anything else                  | 3 + edit distance percentage   |
//!
//! A keyword containing `/` is matched against `repository/package`
//! instead of the bare package name.

use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;

use crate::error::{RepoError, Result};
use crate::index::VersionEntry;
use crate::search::{IndexRow, SearchIndex};

/// Default maximum acceptable score
pub const DEFAULT_MAX_SCORE: u32 = 25;

/// Score of a perfect match
pub const BEST_SCORE: u32 = 0;

const PREFIX_SCORE: u32 = 1;
const SUBSTRING_SCORE: u32 = 2;
const FUZZY_BASE_SCORE: u32 = 3;

/// A search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
    pub package_name: String,
    pub repository_name: String,
    pub version_entry: VersionEntry,
    pub score: u32,
}

impl ScoredResult {
    fn from_row(row: &IndexRow, score: u32) -> Self {
        Self {
            package_name: row.package_name.clone(),
            repository_name: row.repository_name.clone(),
            version_entry: row.version_entry.clone(),
            score,
        }
    }

    /// `repository/package`, the name users install by
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.repository_name, self.package_name)
    }
}

/// Search `index` for `keyword`.
///
/// Literal keywords drop rows scoring above `max_score`. An invalid regex
/// fails the whole call. Results are sorted by score, then package name,
/// then repository name; the sort is stable.
pub fn search(
    index: &SearchIndex,
    keyword: &str,
    max_score: u32,
    use_regex: bool,
) -> Result<Vec<ScoredResult>> {
    let mut results = if keyword.is_empty() {
        all(index)
    } else if use_regex {
        search_regex(index, keyword)?
    } else {
        search_literal(index, keyword, max_score)
    };

    sort_results(&mut results);
    Ok(results)
}

fn all(index: &SearchIndex) -> Vec<ScoredResult> {
    index
        .all_entries()
        .iter()
        .map(|row| ScoredResult::from_row(row, BEST_SCORE))
        .collect()
}

fn search_regex(index: &SearchIndex, pattern: &str) -> Result<Vec<ScoredResult>> {
    let matcher = Regex::new(pattern).map_err(|e| RepoError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    Ok(index
        .all_entries()
        .iter()
        .filter(|row| matcher.is_match(&row.package_name))
        .map(|row| ScoredResult::from_row(row, BEST_SCORE))
        .collect())
}

fn search_literal(index: &SearchIndex, keyword: &str, max_score: u32) -> Vec<ScoredResult> {
    let keyword = keyword.to_lowercase();
    let qualified = keyword.contains('/');

    index
        .all_entries()
        .iter()
        .filter_map(|row| {
            let haystack = if qualified {
                format!("{}/{}", row.repository_name, row.package_name).to_lowercase()
            } else {
                row.package_name.to_lowercase()
            };
            let score = score_name(&keyword, &haystack);
            (score <= max_score).then(|| ScoredResult::from_row(row, score))
        })
        .collect()
}

/// Score an already lower-cased keyword against a lower-cased name
pub fn score_name(keyword: &str, name: &str) -> u32 {
    if name == keyword {
        BEST_SCORE
    } else if name.starts_with(keyword) {
        PREFIX_SCORE
    } else if name.contains(keyword) {
        SUBSTRING_SCORE
    } else {
        let similarity = strsim::normalized_damerau_levenshtein(keyword, name);
        let distance = ((1.0 - similarity) * 100.0).round() as u32;
        FUZZY_BASE_SCORE + distance
    }
}

/// Sort by score, then package name, then repository name
pub fn sort_results(results: &mut [ScoredResult]) {
    results.sort_by(compare);
}

fn compare(a: &ScoredResult, b: &ScoredResult) -> Ordering {
    a.score
        .cmp(&b.score)
        .then_with(|| a.package_name.cmp(&b.package_name))
        .then_with(|| a.repository_name.cmp(&b.repository_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexDocument;

    fn index() -> SearchIndex {
        let mut index = SearchIndex::new();

        let mut stable = IndexDocument::default();
        for (name, version) in [
            ("nginx", "1.0.0"),
            ("nginx", "2.0.0"),
            ("nginx-ingress", "4.0.0"),
            ("redis", "7.0.0"),
            ("postgresql", "12.0.0"),
        ] {
            stable.add_entry(VersionEntry::new(name, version));
        }
        index.add_repository("stable", stable);

        let mut incubator = IndexDocument::default();
        incubator.add_entry(VersionEntry::new("nginx", "1.5.0-rc.1"));
        incubator.add_entry(VersionEntry::new("NGINX", "0.1.0"));
        index.add_repository("incubator", incubator);

        index
    }

    fn names(results: &[ScoredResult]) -> Vec<String> {
        results
            .iter()
            .map(|r| format!("{}@{}", r.qualified_name(), r.version_entry.version))
            .collect()
    }

    #[test]
    fn test_score_name() {
        assert_eq!(score_name("nginx", "nginx"), 0);
        assert_eq!(score_name("ngin", "nginx"), 1);
        assert_eq!(score_name("ingress", "nginx-ingress"), 2);
        // One transposition in a five letter name
        assert_eq!(score_name("ngnix", "nginx"), 3 + 20);
        assert!(score_name("redis", "nginx") > DEFAULT_MAX_SCORE);
    }

    #[test]
    fn test_empty_keyword_lists_everything() {
        let index = index();
        let results = search(&index, "", DEFAULT_MAX_SCORE, false).unwrap();
        assert_eq!(results.len(), index.len());
        assert!(results.iter().all(|r| r.score == BEST_SCORE));
    }

    #[test]
    fn test_empty_keyword_is_idempotent() {
        let index = index();
        let first = search(&index, "", DEFAULT_MAX_SCORE, false).unwrap();
        let second = search(&index, "", DEFAULT_MAX_SCORE, false).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_literal_search_ordering() {
        let results = search(&index(), "nginx", DEFAULT_MAX_SCORE, false).unwrap();
        assert_eq!(
            names(&results),
            vec![
                // Exact, case-insensitive. "NGINX" sorts before "nginx".
                "incubator/NGINX@0.1.0",
                "incubator/nginx@1.5.0-rc.1",
                "stable/nginx@2.0.0",
                "stable/nginx@1.0.0",
                // Prefix
                "stable/nginx-ingress@4.0.0",
            ]
        );
    }

    #[test]
    fn test_max_score_threshold() {
        let index = index();

        let typo = search(&index, "ngnix", DEFAULT_MAX_SCORE, false).unwrap();
        assert!(typo.iter().any(|r| r.package_name == "nginx"));
        assert!(typo.iter().all(|r| r.package_name != "redis"));

        let strict = search(&index, "ngnix", 2, false).unwrap();
        assert!(strict.is_empty());

        let prefix_only = search(&index, "nginx", 1, false).unwrap();
        assert_eq!(prefix_only.len(), 5);
        let exact_only = search(&index, "nginx", 0, false).unwrap();
        assert_eq!(exact_only.len(), 4);
    }

    #[test]
    fn test_qualified_keyword_targets_repository() {
        let results = search(&index(), "stable/nginx", DEFAULT_MAX_SCORE, false).unwrap();
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.repository_name == "stable"));
        assert_eq!(results[0].score, BEST_SCORE);
    }

    #[test]
    fn test_regex_search() {
        let results = search(&index(), "^(redis|postgres)", DEFAULT_MAX_SCORE, true).unwrap();
        assert_eq!(
            names(&results),
            vec!["stable/postgresql@12.0.0", "stable/redis@7.0.0"]
        );
        assert!(results.iter().all(|r| r.score == BEST_SCORE));
    }

    #[test]
    fn test_invalid_regex_fails_whole_call() {
        let err = search(&index(), "(unclosed", DEFAULT_MAX_SCORE, true).unwrap_err();
        assert!(matches!(err, RepoError::InvalidPattern { pattern, .. } if pattern == "(unclosed"));
    }

    #[test]
    fn test_regex_flag_ignored_for_empty_keyword() {
        let index = index();
        let results = search(&index, "", DEFAULT_MAX_SCORE, true).unwrap();
        assert_eq!(results.len(), index.len());
    }
}
