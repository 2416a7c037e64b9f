//! # Diagnostic Fields and Templates
//!
//! A failed check captures [`Fields`]; configured kick and log templates
//! refer to them as `%name%`.
//!
//! ```text
//!   "%player_username% is %distance_measured% away"  +  fields
//!        │
//!        ▼  single left-to-right scan, values are never re-scanned
//!   "bob is 30.0 away"
//! ```
//!
//! Tokens naming an absent field stay in the output verbatim.

use std::fmt;

/// ANSI escape sequences used on console lines.
pub mod ansi {
    /// Reset all attributes.
    pub const RESET: &str = "\u{1b}[0m";
    /// Bright red, for KICK failures.
    pub const RED: &str = "\u{1b}[91m";
    /// Bright yellow, for IGNORE failures.
    pub const YELLOW: &str = "\u{1b}[93m";
    /// Bright green, for active checks at load time.
    pub const GREEN: &str = "\u{1b}[92m";
}

/// One captured diagnostic value.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// Flag.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Float, rendered with at least one decimal (`16.0`).
    Float(f32),
    /// Text.
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i16> for FieldValue {
    fn from(v: i16) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Insertion-ordered diagnostic fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fields {
    entries: Vec<(String, FieldValue)>,
}

impl Fields {
    /// Empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Sets a field, overwriting an earlier value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder form of [`Fields::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Looks up a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Replaces every `%key%` naming a present field and wraps the result in
/// `color` .. `reset`.
#[must_use]
pub fn inject(template: &str, fields: &Fields, color: &str, reset: &str) -> String {
    let mut out = String::with_capacity(color.len() + template.len() + reset.len());
    out.push_str(color);

    let mut rest = template;
    while let Some(open) = rest.find('%') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after
            .find('%')
            .and_then(|close| fields.get(&after[..close]).map(|value| (close, value)));
        match value {
            Some((close, value)) => {
                out.push_str(&value.to_string());
                rest = &after[close + 1..];
            }
            None => {
                out.push('%');
                rest = after;
            }
        }
    }
    out.push_str(rest);

    out.push_str(reset);
    out
}

/// [`inject`] over a list of templates.
#[must_use]
pub fn inject_all(templates: &[String], fields: &Fields, color: &str, reset: &str) -> Vec<String> {
    templates
        .iter()
        .map(|line| inject(line, fields, color, reset))
        .collect()
}
