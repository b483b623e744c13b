//! Literal multi-signature matching.
//!
//! Signatures are plain text, never patterns. The search is a single left-to-right scan that
//! behaves like an escaped regular expression alternation: at each position the first
//! signature in set order wins, and consumed text is not scanned again.

use crate::error::Kind;
use aho_corasick::{AhoCorasick, MatchKind};
use anyhow::Result;

/// Root detection strings searched for by default.
///
/// Based on the usual checks for `su` binaries, the Superuser application and test-keys
/// builds.
pub const DEFAULT_SIGNATURES: &[&str] = &[
    "/system/app/Superuser.apk",
    "/sbin/su",
    "/system/bin/su",
    "/system/xbin/su",
    "/data/local/xbin/su",
    "/data/local/bin/su",
    "/system/sd/xbin/su",
    "/system/bin/failsafe/su",
    "/data/local/su",
    "/su/bin/su",
    "test-keys",
    "\"/system/xbin/which\", \"su\"",
    "'/system/xbin/which', 'su'",
];

/// Ordered set of literal strings to search for.
///
/// Empty strings are dropped, since they would match at every position. Duplicates are kept:
/// they are harmless, only the first copy can ever match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureSet {
    signatures: Vec<String>,
}

impl SignatureSet {
    /// Creates a new signature set, keeping the given order.
    pub fn new<I, S>(signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            signatures: signatures
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        }
    }

    /// Gets the built-in root detection signature set.
    pub fn root_detection() -> Self {
        Self::new(DEFAULT_SIGNATURES.iter().copied())
    }

    /// Number of signatures in the set.
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    /// Whether the set has no signatures.
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Iterates over the signatures in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.signatures.iter().map(String::as_str)
    }
}

/// One occurrence of a signature in a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'s> {
    signature: &'s str,
    start: usize,
    end: usize,
}

impl<'s> Match<'s> {
    /// The signature that matched.
    pub fn signature(&self) -> &'s str {
        self.signature
    }

    /// Byte offset where the match starts.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset right after the match.
    pub fn end(&self) -> usize {
        self.end
    }
}

/// Compiled matcher for a signature set.
#[derive(Debug)]
pub struct Matcher {
    signatures: SignatureSet,
    automaton: Option<AhoCorasick>,
}

impl Matcher {
    /// Compiles a matcher for the given signatures.
    pub fn new(signatures: SignatureSet) -> Result<Self> {
        let automaton = if signatures.is_empty() {
            None
        } else {
            let automaton = AhoCorasick::builder()
                .match_kind(MatchKind::LeftmostFirst)
                .build(signatures.iter())
                .map_err(|e| Kind::Matcher {
                    message: e.to_string(),
                })?;
            Some(automaton)
        };

        Ok(Self {
            signatures,
            automaton,
        })
    }

    /// Gets the signature set this matcher searches for.
    pub fn signatures(&self) -> &SignatureSet {
        &self.signatures
    }

    /// Finds every non-overlapping occurrence in document order.
    pub fn find_all<'m>(&'m self, text: &str) -> Vec<Match<'m>> {
        let automaton = match self.automaton {
            Some(ref a) => a,
            None => return Vec::new(),
        };

        automaton
            .find_iter(text)
            .map(|m| Match {
                signature: self.signatures.signatures[m.pattern().as_usize()].as_str(),
                start: m.start(),
                end: m.end(),
            })
            .collect()
    }
}
