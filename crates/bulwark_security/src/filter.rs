//! # Chat Content Filter
//!
//! Phrases come from a line-oriented file:
//!
//! ```text
//! # comment
//! badword          <- kept
//! ab               <- dropped, fewer than 3 characters
//! ```
//!
//! Each phrase is matched literally. Detection compares lower-cased text
//! against the lower-cased phrase; censoring replaces every occurrence,
//! in any case, with the first character, asterisks, and the last character.
//!
//! The active set is an immutable [`PhraseSet`] behind an `Arc`. Loading
//! builds a whole new set and swaps it in, so a concurrent `test` or
//! `censor` sees either the old set or the new one.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use regex::{NoExpand, Regex, RegexBuilder};
use tracing::{error, info, warn};

use crate::error::{SecurityError, SecurityResult};

/// Minimum phrase length in characters.
pub const MIN_PHRASE_LEN: usize = 3;

/// Written when the filter file does not exist.
pub const FILTER_FILE_HEADER: &str = "# Added phrases here to be blocked from chat & usernames.\n\
# Filters can only be 3 or more characters in length.\n";

#[derive(Debug)]
struct Phrase {
    text: String,
    detect: Regex,
    replace: Regex,
    censored: String,
}

impl Phrase {
    fn compile(text: &str) -> Option<Self> {
        let escaped = regex::escape(text);
        let detect = Regex::new(&regex::escape(&text.to_lowercase())).ok()?;
        let replace = RegexBuilder::new(&escaped)
            .case_insensitive(true)
            .build()
            .ok()?;
        Some(Self {
            text: text.to_owned(),
            detect,
            replace,
            censored: censor_word(text),
        })
    }
}

/// First character, one asterisk per middle character, last character.
#[must_use]
pub fn censor_word(phrase: &str) -> String {
    let chars: Vec<char> = phrase.chars().collect();
    match chars.as_slice() {
        [] => String::new(),
        [only] => only.to_string(),
        [first, middle @ .., last] => {
            let mut out = String::with_capacity(phrase.len());
            out.push(*first);
            out.extend(std::iter::repeat('*').take(middle.len()));
            out.push(*last);
            out
        }
    }
}

/// An immutable, compiled phrase list.
#[derive(Debug, Default)]
pub struct PhraseSet {
    phrases: Vec<Phrase>,
}

impl PhraseSet {
    /// Parses filter-file text. Returns the set and the phrases dropped for
    /// being too short.
    #[must_use]
    pub fn parse(source: &str) -> (Self, Vec<String>) {
        let mut phrases = Vec::new();
        let mut rejected = Vec::new();
        for line in source.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.chars().count() < MIN_PHRASE_LEN {
                warn!("Filter ignored due to being less than 3 characters in length.");
                rejected.push(line.to_owned());
                continue;
            }
            if let Some(phrase) = Phrase::compile(line) {
                phrases.push(phrase);
            }
        }
        (Self { phrases }, rejected)
    }

    /// Builds a set from phrases directly, applying the length rule.
    #[must_use]
    pub fn from_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_owned())
            .filter(|p| p.chars().count() >= MIN_PHRASE_LEN)
            .filter_map(|p| Phrase::compile(&p))
            .collect();
        Self { phrases }
    }

    /// Number of phrases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    /// Returns true with no phrases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Phrase texts in file order.
    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        self.phrases.iter().map(|p| p.text.as_str())
    }

    /// Returns true if any phrase occurs in `text`, ignoring case.
    #[must_use]
    pub fn test(&self, text: &str) -> bool {
        if text.is_empty() || self.phrases.is_empty() {
            return false;
        }
        let lower = text.to_lowercase();
        self.phrases.iter().any(|p| p.detect.is_match(&lower))
    }

    /// Censors every occurrence of every phrase.
    #[must_use]
    pub fn censor(&self, text: &str) -> String {
        let mut out = text.to_owned();
        for phrase in &self.phrases {
            if phrase.replace.is_match(&out) {
                out = phrase
                    .replace
                    .replace_all(&out, NoExpand(&phrase.censored))
                    .into_owned();
            }
        }
        out
    }
}

/// Reloadable filter bound to a file.
#[derive(Debug)]
pub struct TextFilter {
    path: PathBuf,
    active: RwLock<Arc<PhraseSet>>,
}

impl TextFilter {
    /// Creates an empty filter for `path`. Call [`TextFilter::load`] to fill it.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            active: RwLock::new(Arc::new(PhraseSet::default())),
        }
    }

    /// Filter file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-reads the filter file and swaps in the result.
    ///
    /// A missing file is created with [`FILTER_FILE_HEADER`] and leaves the
    /// filter empty. On a read error the filter is emptied.
    ///
    /// # Errors
    ///
    /// [`SecurityError::Io`] when the file can be neither read nor created.
    pub fn load(&self) -> SecurityResult<usize> {
        let source = match fs::read_to_string(&self.path) {
            Ok(source) => source,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.swap(PhraseSet::default());
                return self.create_file().map(|()| 0);
            }
            Err(e) => {
                self.swap(PhraseSet::default());
                error!("Failed to read from {}.", self.path.display());
                return Err(SecurityError::io(&self.path, e));
            }
        };

        let (set, _) = PhraseSet::parse(&source);
        let count = set.len();
        self.swap(set);
        info!(target: "security", "Loaded {count} filter phrase(s).");
        Ok(count)
    }

    fn create_file(&self) -> SecurityResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SecurityError::io(parent, e))?;
        }
        fs::write(&self.path, FILTER_FILE_HEADER).map_err(|e| SecurityError::io(&self.path, e))
    }

    /// Replaces the active set.
    pub fn swap(&self, set: PhraseSet) {
        *self.active.write() = Arc::new(set);
    }

    /// Snapshot of the active set.
    #[must_use]
    pub fn snapshot(&self) -> Arc<PhraseSet> {
        Arc::clone(&self.active.read())
    }

    /// See [`PhraseSet::test`].
    #[must_use]
    pub fn test(&self, text: &str) -> bool {
        self.snapshot().test(text)
    }

    /// See [`PhraseSet::censor`].
    #[must_use]
    pub fn censor(&self, text: &str) -> String {
        self.snapshot().censor(text)
    }

    /// Active phrase count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.read().len()
    }

    /// Returns true with no active phrases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.read().is_empty()
    }
}
