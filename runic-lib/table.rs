//! Mnemonic-to-symbol lookup.
//!
//! An [`AbbreviationTable`] maps short ASCII mnemonics (`alpha`, `to`, `<>`)
//! to the Unicode replacement text that should appear in the buffer. The
//! rewriter asks it two questions while the user types: "does this exact
//! mnemonic resolve?" and "could this still become a mnemonic?" — the
//! second is a prefix query, which is why the entries live in a `BTreeMap`
//! (an ordered range scan answers it without touching unrelated keys).
//!
//! A replacement may carry one [`CURSOR_PLACEHOLDER`] token marking where
//! the caret should land after insertion: `"⟨$CURSOR⟩"` inserts `⟨⟩` and
//! parks the caret between the brackets. [`resolve_placeholder`] performs
//! that split.
//!
//! The built-in vocabulary ships as `assets/abbreviations.json`, embedded
//! at compile time and parsed once. User customizations are merged on top
//! with [`AbbreviationTable::extend_from_json`] or plain
//! [`insert`](AbbreviationTable::insert); later insertions win, which is
//! the whole collision policy (ties are never resolved fuzzily).

use std::{
  collections::BTreeMap,
  ops::Bound,
};

use once_cell::sync::Lazy;
use runic_core::chars::char_is_mnemonic;
use thiserror::Error;

use crate::Tendril;

pub type Result<T> = std::result::Result<T, TableError>;

/// Reserved token inside a replacement marking the caret landing position.
pub const CURSOR_PLACEHOLDER: &str = "$CURSOR";

const BUILTIN_JSON: &str = include_str!("assets/abbreviations.json");

static BUILTIN: Lazy<AbbreviationTable> = Lazy::new(|| {
  AbbreviationTable::from_json(BUILTIN_JSON)
    .expect("could not parse built-in abbreviations.json")
});

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TableError {
  #[error("invalid abbreviation json: {0}")]
  InvalidJson(#[from] serde_json::Error),
  #[error("abbreviation json must be an object of string entries")]
  NotAnObject,
  #[error("abbreviation entry {key:?} must map to a string")]
  NonStringEntry { key: String },
}

/// Ordered mnemonic → replacement map.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AbbreviationTable {
  entries: BTreeMap<String, String>,
}

impl AbbreviationTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// The compiled-in symbol set.
  pub fn builtin() -> Self {
    BUILTIN.clone()
  }

  /// Parse a JSON object of `mnemonic: replacement` pairs.
  pub fn from_json(json: &str) -> Result<Self> {
    let mut table = Self::new();
    table.extend_from_json(json)?;
    Ok(table)
  }

  /// Merge a JSON object of `mnemonic: replacement` pairs into this table,
  /// overriding existing entries. Keys with characters that cannot be
  /// typed as part of a mnemonic are skipped with a warning rather than
  /// failing the whole load.
  pub fn extend_from_json(&mut self, json: &str) -> Result<()> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let object = value.as_object().ok_or(TableError::NotAnObject)?;

    for (key, value) in object {
      let Some(replacement) = value.as_str() else {
        return Err(TableError::NonStringEntry { key: key.clone() });
      };
      if key.is_empty() || !key.chars().all(char_is_mnemonic) {
        tracing::warn!(key = %key, "skipping abbreviation with untypeable mnemonic");
        continue;
      }
      self.entries.insert(key.clone(), replacement.to_owned());
    }

    Ok(())
  }

  pub fn insert(&mut self, mnemonic: impl Into<String>, replacement: impl Into<String>) {
    self.entries.insert(mnemonic.into(), replacement.into());
  }

  pub fn remove(&mut self, mnemonic: &str) -> Option<String> {
    self.entries.remove(mnemonic)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// The replacement for `mnemonic`, placeholder token still embedded.
  pub fn exact_match(&self, mnemonic: &str) -> Option<&str> {
    self.entries.get(mnemonic).map(String::as_str)
  }

  /// All mnemonics starting with `prefix`, in lexicographic order.
  pub fn prefix_matches<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    self
      .entries
      .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
      .map(|(mnemonic, _)| mnemonic.as_str())
      .take_while(move |mnemonic| mnemonic.starts_with(prefix))
  }

  /// Whether any mnemonic starts with `prefix`. This is what decides if a
  /// just-typed character can still extend an abbreviation.
  pub fn has_prefix(&self, prefix: &str) -> bool {
    self.prefix_matches(prefix).next().is_some()
  }
}

/// A replacement with its placeholder resolved: the literal text to insert
/// and the char offset within it where the caret lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
  pub text:   Tendril,
  pub cursor: usize,
}

/// Split the first [`CURSOR_PLACEHOLDER`] out of a replacement. Without a
/// placeholder the caret goes past the end of the inserted text; any
/// occurrence after the first is kept literally.
pub fn resolve_placeholder(replacement: &str) -> Insertion {
  match replacement.split_once(CURSOR_PLACEHOLDER) {
    Some((before, after)) => {
      let mut text = Tendril::from(before);
      text.push_str(after);
      Insertion {
        text,
        cursor: before.chars().count(),
      }
    },
    None => Insertion {
      text:   Tendril::from(replacement),
      cursor: replacement.chars().count(),
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn small_table() -> AbbreviationTable {
    let mut table = AbbreviationTable::new();
    table.insert("alpha", "α");
    table.insert("all", "∀");
    table.insert("to", "→");
    table.insert("top", "⊤");
    table.insert("ang", "⟨$CURSOR⟩");
    table
  }

  #[test]
  fn exact_lookup() {
    let table = small_table();
    assert_eq!(table.exact_match("alpha"), Some("α"));
    assert_eq!(table.exact_match("alph"), None);
    assert_eq!(table.exact_match(""), None);
  }

  #[test]
  fn prefix_scan_is_ordered_and_bounded() {
    let table = small_table();
    let matches: Vec<_> = table.prefix_matches("al").collect();
    assert_eq!(matches, vec!["all", "alpha"]);
    assert!(table.has_prefix("t"));
    assert!(!table.has_prefix("q"));
    assert_eq!(table.prefix_matches("to").count(), 2);
  }

  #[test]
  fn empty_prefix_matches_everything() {
    let table = small_table();
    assert_eq!(table.prefix_matches("").count(), table.len());
  }

  #[test]
  fn placeholder_resolution() {
    let insertion = resolve_placeholder("⟨$CURSOR⟩");
    assert_eq!(insertion.text.as_str(), "⟨⟩");
    assert_eq!(insertion.cursor, 1);

    let insertion = resolve_placeholder("→");
    assert_eq!(insertion.text.as_str(), "→");
    assert_eq!(insertion.cursor, 1);

    // Only the first placeholder is consumed.
    let insertion = resolve_placeholder("|$CURSOR|$CURSOR");
    assert_eq!(insertion.text.as_str(), "||$CURSOR");
    assert_eq!(insertion.cursor, 1);
  }

  #[test]
  fn json_merge_overrides_and_validates() {
    let mut table = small_table();
    table
      .extend_from_json(r#"{ "alpha": "Α", "qed": "∎", "has space": "x", "": "y" }"#)
      .unwrap();
    assert_eq!(table.exact_match("alpha"), Some("Α"));
    assert_eq!(table.exact_match("qed"), Some("∎"));
    assert_eq!(table.exact_match("has space"), None);

    assert!(matches!(
      AbbreviationTable::from_json(r#"[1, 2]"#),
      Err(TableError::NotAnObject)
    ));
    assert!(matches!(
      AbbreviationTable::from_json(r#"{ "a": 3 }"#),
      Err(TableError::NonStringEntry { .. })
    ));
    assert!(matches!(
      AbbreviationTable::from_json("nope"),
      Err(TableError::InvalidJson(_))
    ));
  }

  #[test]
  fn builtin_set_loads() {
    let table = AbbreviationTable::builtin();
    assert!(table.len() > 100);
    assert_eq!(table.exact_match("alpha"), Some("α"));
    assert_eq!(table.exact_match("to"), Some("→"));
    assert_eq!(table.exact_match("\\"), Some("\\"));
    // "to" is not a unique prefix in the built-in set ("top" exists).
    assert!(table.prefix_matches("to").count() > 1);
  }
}
