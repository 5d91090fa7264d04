//! Query sources: where dropdown candidates come from.
//!
//! A [`QuerySource`] maps the text the user typed to a future resolving to
//! candidate entries. Remote sources answer whenever the server does; the
//! combo box keeps polling without blocking input and ignores answers that
//! were overtaken by a newer query.
//!
//! # Example
//!
//! ```
//! use horizon_ux::query::{QuerySource, StaticQuerySource};
//! use futures_util::FutureExt;
//!
//! let source = StaticQuerySource::new(
//!     vec!["Apple".to_string(), "Apricot".to_string(), "Banana".to_string()],
//!     |s: &String| s.clone(),
//! );
//! let result = source.query("ap").now_or_never().unwrap().unwrap();
//! assert_eq!(result, vec!["Apple".to_string(), "Apricot".to_string()]);
//! ```

use std::fmt;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use horizon_ux_core::logging::targets;

use crate::config::TextProjection;
use crate::error::QueryError;

/// Which candidate to highlight once results arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SelectionDirection {
    /// Highlight the last entry.
    Previous,
    /// Highlight nothing.
    #[default]
    None,
    /// Highlight the first entry.
    Next,
}

/// The outcome of a query.
pub type QueryResult<E> = std::result::Result<Vec<E>, QueryError>;

/// A pending query.
pub type QueryFuture<E> = BoxFuture<'static, QueryResult<E>>;

/// Produces candidate entries for a partial input.
pub trait QuerySource<E>: Send + Sync {
    /// Start a lookup for `text`.
    fn query(&self, text: &str) -> QueryFuture<E>;
}

impl<E, F> QuerySource<E> for F
where
    F: Fn(&str) -> QueryFuture<E> + Send + Sync,
{
    fn query(&self, text: &str) -> QueryFuture<E> {
        self(text)
    }
}

/// Shared handle to a query source.
pub type SharedQuerySource<E> = Arc<dyn QuerySource<E>>;

// ============================================================================
// Static Query Source
// ============================================================================

/// Controls how matching handles letter case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseSensitivity {
    /// "App" won't match "apple".
    CaseSensitive,
    /// "App" will match "apple".
    #[default]
    CaseInsensitive,
}

/// Where the query text has to occur in an entry's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// The entry text starts with the query.
    #[default]
    Prefix,
    /// The entry text contains the query anywhere.
    Contains,
}

/// A query source filtering a fixed list of entries in memory.
///
/// An empty query returns every entry.
pub struct StaticQuerySource<E> {
    entries: Vec<E>,
    projection: TextProjection<E>,
    match_mode: MatchMode,
    case_sensitivity: CaseSensitivity,
    max_results: Option<usize>,
}

impl<E: Clone + Send + Sync + 'static> StaticQuerySource<E> {
    /// Create a source over `entries`, matched on `projection(entry)`.
    pub fn new<F>(entries: Vec<E>, projection: F) -> Self
    where
        F: Fn(&E) -> String + Send + Sync + 'static,
    {
        Self {
            entries,
            projection: Arc::new(projection),
            match_mode: MatchMode::default(),
            case_sensitivity: CaseSensitivity::default(),
            max_results: None,
        }
    }

    /// Set the match mode using builder pattern.
    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    /// Set the case sensitivity using builder pattern.
    pub fn with_case_sensitivity(mut self, sensitivity: CaseSensitivity) -> Self {
        self.case_sensitivity = sensitivity;
        self
    }

    /// Cap the number of results using builder pattern.
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }

    /// The entries.
    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    /// Replace the entries.
    pub fn set_entries(&mut self, entries: Vec<E>) {
        self.entries = entries;
    }

    /// Filter synchronously.
    pub fn matches(&self, text: &str) -> Vec<E> {
        let limit = self.max_results.unwrap_or(usize::MAX);
        if text.is_empty() {
            return self.entries.iter().take(limit).cloned().collect();
        }

        let needle = match self.case_sensitivity {
            CaseSensitivity::CaseSensitive => text.to_string(),
            CaseSensitivity::CaseInsensitive => text.to_lowercase(),
        };

        self.entries
            .iter()
            .filter(|entry| {
                let candidate = (self.projection)(entry);
                let candidate = match self.case_sensitivity {
                    CaseSensitivity::CaseSensitive => candidate,
                    CaseSensitivity::CaseInsensitive => candidate.to_lowercase(),
                };
                match self.match_mode {
                    MatchMode::Prefix => candidate.starts_with(&needle),
                    MatchMode::Contains => candidate.contains(&needle),
                }
            })
            .take(limit)
            .cloned()
            .collect()
    }
}

impl<E: Clone + Send + Sync + 'static> QuerySource<E> for StaticQuerySource<E> {
    fn query(&self, text: &str) -> QueryFuture<E> {
        let matches = self.matches(text);
        tracing::trace!(
            target: targets::QUERY,
            query = text,
            results = matches.len(),
            "static query"
        );
        futures_util::future::ready(Ok(matches)).boxed()
    }
}

impl<E> fmt::Debug for StaticQuerySource<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticQuerySource")
            .field("entries", &self.entries.len())
            .field("match_mode", &self.match_mode)
            .field("case_sensitivity", &self.case_sensitivity)
            .field("max_results", &self.max_results)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fruits() -> StaticQuerySource<String> {
        StaticQuerySource::new(
            vec![
                "Apple".to_string(),
                "Application".to_string(),
                "Banana".to_string(),
                "Pineapple".to_string(),
            ],
            |s: &String| s.clone(),
        )
    }

    #[test]
    fn test_prefix_match_case_insensitive() {
        let source = fruits();
        assert_eq!(source.matches("app"), vec!["Apple", "Application"]);
        assert_eq!(source.matches("").len(), 4);
        assert!(source.matches("xyz").is_empty());
    }

    #[test]
    fn test_case_sensitive() {
        let source = fruits().with_case_sensitivity(CaseSensitivity::CaseSensitive);
        assert!(source.matches("app").is_empty());
        assert_eq!(source.matches("App"), vec!["Apple", "Application"]);
    }

    #[test]
    fn test_contains_and_limit() {
        let source = fruits().with_match_mode(MatchMode::Contains);
        assert_eq!(source.matches("apple"), vec!["Apple", "Pineapple"]);

        let source = source.with_max_results(1);
        assert_eq!(source.matches("apple"), vec!["Apple"]);
        assert_eq!(source.matches(""), vec!["Apple"]);
    }

    #[test]
    fn test_query_future_resolves_immediately() {
        let source = fruits();
        let result = source.query("ban").now_or_never();
        assert_eq!(result, Some(Ok(vec!["Banana".to_string()])));
    }

    #[test]
    fn test_closure_source() {
        let source = |text: &str| -> QueryFuture<String> {
            let text = text.to_string();
            async move {
                if text == "fail" {
                    Err(QueryError::failed("backend down"))
                } else {
                    Ok(vec![text])
                }
            }
            .boxed()
        };
        assert_eq!(source.query("x").now_or_never(), Some(Ok(vec!["x".to_string()])));
        assert!(matches!(
            source.query("fail").now_or_never(),
            Some(Err(QueryError::Failed(_)))
        ));
    }
}
