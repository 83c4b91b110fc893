//! The search engine: an immutable corpus paired with its suffix index.
//!
//! A [`SearchEngine`] only exists once its corpus has been read and indexed,
//! and it has no mutating methods, so it can be shared across request
//! handlers behind an `Arc` without locks.
//!
//! # Query semantics
//!
//! Queries are case-insensitive regular expressions (`(?i)` + query, not
//! escaped). Matches are the leftmost non-overlapping occurrences across the
//! whole corpus, in position order. Each match is returned as a snippet of
//! up to `result_window` bytes on either side of the match start, clipped to
//! the corpus.
//!
//! Plain literal queries are answered from the [`SuffixIndex`] instead of a
//! regex scan whenever the two are guaranteed to agree.

use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use crate::index::SuffixIndex;

/// Bytes of context on each side of a match.
pub const DEFAULT_RESULT_WINDOW: usize = 250;

/// Snippets returned per page.
pub const DEFAULT_MAX_NEW_RESULTS: usize = 20;

/// Non-ASCII characters whose simple case fold is an ASCII letter
/// (`ſ` → `s`, Kelvin sign → `k`). The ASCII-folded index cannot see them.
const ASCII_FOLD_ALIASES: [char; 2] = ['\u{017F}', '\u{212A}'];

#[derive(Debug, Error)]
pub enum EngineError {
    /// The corpus could not be read (missing file, permissions, not UTF-8).
    #[error("load {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The query is not a valid regular expression.
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] regex::Error),
}

/// Windowing and paging parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub result_window: usize,
    pub max_new_results: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            result_window: DEFAULT_RESULT_WINDOW,
            max_new_results: DEFAULT_MAX_NEW_RESULTS,
        }
    }
}

#[derive(Debug)]
pub struct SearchEngine {
    corpus: String,
    index: SuffixIndex,
    ascii_foldable: bool,
    options: SearchOptions,
}

impl SearchEngine {
    /// Reads the corpus at `path` and indexes it.
    pub fn load(path: &Path, options: SearchOptions) -> Result<Self, EngineError> {
        let corpus = std::fs::read_to_string(path).map_err(|source| EngineError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), bytes = corpus.len(), "corpus loaded");
        Ok(Self::with_options(corpus, options))
    }

    /// Indexes an in-memory corpus with default options.
    pub fn from_text(corpus: impl Into<String>) -> Self {
        Self::with_options(corpus.into(), SearchOptions::default())
    }

    pub fn with_options(corpus: String, options: SearchOptions) -> Self {
        let started = Instant::now();
        let index = SuffixIndex::new(corpus.as_bytes());
        let ascii_foldable = !corpus.chars().any(|c| ASCII_FOLD_ALIASES.contains(&c));
        info!(
            bytes = index.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            ascii_foldable,
            "suffix index built"
        );
        Self {
            corpus,
            index,
            ascii_foldable,
            options,
        }
    }

    pub fn corpus(&self) -> &str {
        &self.corpus
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }

    /// Returns the page of snippets for matches `already_seen ..
    /// already_seen + max_new_results`, in corpus order.
    ///
    /// An empty page means the caller has seen every match.
    pub fn search(&self, query: &str, already_seen: usize) -> Result<Vec<&str>, EngineError> {
        let page = self.options.max_new_results;
        let literal = self.literal_pattern(query);

        let snippets: Vec<&str> = match literal {
            Some(pattern) => self
                .index
                .find_non_overlapping(pattern)
                .into_iter()
                .skip(already_seen)
                .take(page)
                .map(|start| self.snippet(start))
                .collect(),
            None => compile(query)?
                .find_iter(&self.corpus)
                .skip(already_seen)
                .take(page)
                .map(|m| self.snippet(m.start()))
                .collect(),
        };

        debug!(
            query,
            already_seen,
            returned = snippets.len(),
            indexed = literal.is_some(),
            "search"
        );
        Ok(snippets)
    }

    /// Counts every non-overlapping match of `query`.
    pub fn total_matches(&self, query: &str) -> Result<usize, EngineError> {
        match self.literal_pattern(query) {
            Some(pattern) => Ok(self.index.find_non_overlapping(pattern).len()),
            None => Ok(compile(query)?.find_iter(&self.corpus).count()),
        }
    }

    /// Returns the query bytes when the suffix index gives exactly the
    /// matches a `(?i)` regex scan would: a non-empty ASCII query with no
    /// regex metacharacters, over a corpus without non-ASCII case aliases of
    /// ASCII letters.
    fn literal_pattern<'q>(&self, query: &'q str) -> Option<&'q [u8]> {
        let literal = !query.is_empty() && query.is_ascii() && regex::escape(query) == query;
        (literal && self.ascii_foldable).then_some(query.as_bytes())
    }

    /// Window of `result_window` bytes either side of `start`, clipped to
    /// the corpus and narrowed to char boundaries.
    fn snippet(&self, start: usize) -> &str {
        let window = self.options.result_window;
        let mut from = start.saturating_sub(window);
        let mut to = start.saturating_add(window).min(self.corpus.len());

        while !self.corpus.is_char_boundary(from) {
            from += 1;
        }
        while !self.corpus.is_char_boundary(to) {
            to -= 1;
        }
        &self.corpus[from..to]
    }
}

fn compile(query: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("(?i){query}"))
}
