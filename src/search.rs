// src/search.rs

//! Searching the AUR for several terms at once
//!
//! A term starting with `^` or ending with `$` is treated as a regular
//! expression over package names. The anchors are stripped before the term
//! is sent to the AUR, and the results are filtered locally.

use crate::error::{Error, PackageFailure, Result};
use crate::repository::{RemoteIndex, RemoteMetadata};
use regex::Regex;
use tracing::debug;

#[derive(Debug, Default)]
pub struct SearchReport {
    /// Matches from all queries, sorted and unique by name
    pub results: Vec<RemoteMetadata>,
    /// Queries that failed, keyed by the query text
    pub failures: Vec<PackageFailure>,
}

/// A parsed search term
#[derive(Debug)]
pub struct SearchQuery {
    term: String,
    filter: Option<Regex>,
}

impl SearchQuery {
    pub fn parse(query: &str) -> Result<Self> {
        if query.starts_with('^') || query.ends_with('$') {
            let filter = Regex::new(query)
                .map_err(|e| Error::Parse(format!("invalid search pattern {}: {}", query, e)))?;
            Ok(Self {
                term: query.trim_matches(|c| c == '^' || c == '$').to_string(),
                filter: Some(filter),
            })
        } else {
            Ok(Self {
                term: query.to_string(),
                filter: None,
            })
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.filter.as_ref().is_none_or(|re| re.is_match(name))
    }

    fn run(&self, remote: &(impl RemoteIndex + ?Sized)) -> Result<Vec<RemoteMetadata>> {
        let results = remote.search(&self.term)?;
        Ok(results.into_iter().filter(|m| self.matches(&m.name)).collect())
    }
}

/// Run every query and merge the results
pub fn search_all<R>(remote: &R, queries: &[String]) -> SearchReport
where
    R: RemoteIndex + ?Sized,
{
    let mut report = SearchReport::default();

    for query in queries {
        let found = SearchQuery::parse(query).and_then(|q| q.run(remote));
        match found {
            Ok(results) => {
                debug!("Search for '{}' returned {} packages", query, results.len());
                report.results.extend(results);
            }
            Err(e) => report.failures.push(PackageFailure::new(query.clone(), e)),
        }
    }

    report.results.sort_by(|a, b| a.name.cmp(&b.name));
    report.results.dedup_by(|a, b| a.name == b.name);
    report
}
