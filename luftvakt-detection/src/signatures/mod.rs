//! ## luftvakt-detection::signatures
//! **Aho-Corasick pattern matching with thread-safe updates**
//!
//! Patterns match ASCII case-insensitively. The matcher is rebuilt on every
//! update, so a running detector picks up new patterns on its next scan.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use parking_lot::RwLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("Pattern compilation failed: {0}")]
    PatternError(String),
}

pub struct SignatureEngine {
    patterns: RwLock<Vec<String>>,
    matcher: RwLock<Option<AhoCorasick>>,
}

impl SignatureEngine {
    pub fn new() -> Self {
        Self {
            patterns: RwLock::new(Vec::new()),
            matcher: RwLock::new(None),
        }
    }

    pub fn with_patterns<I, S>(patterns: I) -> Result<Self, SignatureError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let engine = Self::new();
        engine.patterns_extend(patterns)?;
        Ok(engine)
    }

    pub fn pattern_add(&self, pattern: &str) -> Result<(), SignatureError> {
        self.patterns_extend([pattern])
    }

    pub fn patterns_extend<I, S>(&self, patterns: I) -> Result<(), SignatureError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns
            .write()
            .extend(patterns.into_iter().map(Into::into));
        self.rebuild_matcher()
    }

    fn rebuild_matcher(&self) -> Result<(), SignatureError> {
        let patterns = self.patterns.read();
        if patterns.is_empty() {
            *self.matcher.write() = None;
            return Ok(());
        }
        let matcher = AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .build(patterns.iter())
            .map_err(|e| SignatureError::PatternError(e.to_string()))?;

        *self.matcher.write() = Some(matcher);
        Ok(())
    }

    /// Indices of every pattern found in `data`, overlaps included.
    #[inline]
    pub fn buffer_scan(&self, data: &[u8]) -> Vec<usize> {
        let matcher = self.matcher.read();
        matcher.as_ref().map_or(Vec::new(), |matcher| {
            matcher
                .find_overlapping_iter(data)
                .map(|m| m.pattern().as_usize())
                .collect()
        })
    }

    pub fn pattern(&self, index: usize) -> Option<String> {
        self.patterns.read().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.patterns.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.read().is_empty()
    }
}

impl Default for SignatureEngine {
    fn default() -> Self {
        Self::new()
    }
}
