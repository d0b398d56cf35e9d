//! A single in-progress abbreviation and its edit-absorption rules.
//!
//! A [`TrackedAbbreviation`] is born the moment the leader character is
//! typed and follows the mnemonic as the buffer changes underneath it. Its
//! `text` is maintained purely incrementally — it must always equal what
//! the buffer holds inside `span`, but the buffer is never re-read. Every
//! raw edit the host delivers is classified by [`process_edit`] into one of
//! four cases, in priority order:
//!
//! 1. Edit inside the mnemonic: absorbed (span resized, text spliced),
//!    unless it is a tail append that no known mnemonic can extend — then
//!    the abbreviation is marked finished and the edit is left alone.
//! 2. Edit entirely before: the span slides by the edit's length delta.
//! 3. Edit entirely after: nothing to do.
//! 4. Edit straddling a span boundary: tracking stops. Recovering the text
//!    would require reading the buffer back, which this design avoids.
//!
//! [`process_edit`]: TrackedAbbreviation::process_edit

use runic_core::span::Span;

use crate::{
  Tendril,
  table::AbbreviationTable,
};

/// What a raw edit did to a tracked abbreviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditOutcome {
  /// The edit landed inside the mnemonic and was absorbed.
  pub affected:      bool,
  /// The edit made the mnemonic ill-defined; the owner must drop this
  /// tracker.
  pub stop_tracking: bool,
}

impl EditOutcome {
  const ABSORBED: Self = Self {
    affected:      true,
    stop_tracking: false,
  };
  const UNTOUCHED: Self = Self {
    affected:      false,
    stop_tracking: false,
  };
  const ABORT: Self = Self {
    affected:      false,
    stop_tracking: true,
  };
}

/// One mnemonic currently being typed. `span` covers the mnemonic
/// characters only; the leader sits one position before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedAbbreviation {
  span:     Span,
  text:     Tendril,
  finished: bool,
}

impl TrackedAbbreviation {
  /// Start tracking at the position right after a freshly typed leader.
  pub fn new(start: usize) -> Self {
    debug_assert!(start > 0, "mnemonic cannot start at offset 0");
    Self {
      span:     Span::point(start),
      text:     Tendril::new(),
      finished: false,
    }
  }

  #[inline]
  pub fn span(&self) -> Span {
    self.span
  }

  #[inline]
  pub fn text(&self) -> &str {
    &self.text
  }

  /// Whether this abbreviation is due to be flushed: the user typed
  /// something no mnemonic can absorb.
  #[inline]
  pub fn is_finished(&self) -> bool {
    self.finished
  }

  /// The span to replace on flush, leader character included.
  #[inline]
  pub fn replaceable_span(&self) -> Span {
    self.span.shift_start_keep_end(-1)
  }

  /// Classify and absorb one raw edit, given in buffer coordinates as they
  /// were before the edit was applied.
  pub fn process_edit(
    &mut self,
    table: &AbbreviationTable,
    edit_span: Span,
    new_text: &str,
  ) -> EditOutcome {
    let len_delta = new_text.chars().count() as isize - edit_span.length as isize;

    if self.span.contains(edit_span) {
      self.finished = false;

      // A contained edit starting at or past the typed end is a pure
      // append (containment forces its length to 0). If the extended text
      // can no longer become any mnemonic, the abbreviation is done with
      // whatever it already had and the edit stays a plain buffer edit.
      if edit_span.offset >= self.span.end() {
        let mut candidate = self.text.clone();
        candidate.push_str(new_text);
        if !table.has_prefix(&candidate) {
          tracing::trace!(text = %self.text, rejected = new_text, "mnemonic dead end");
          self.finished = true;
          return EditOutcome::UNTOUCHED;
        }
      }

      let rel = edit_span.offset - self.span.offset;
      splice(&mut self.text, rel, edit_span.length, new_text);
      self.span = self.span.resize_end(len_delta);
      return EditOutcome::ABSORBED;
    }

    if edit_span.is_before(self.span) {
      self.span = self.span.translate(len_delta);
      return EditOutcome::UNTOUCHED;
    }

    if edit_span.is_after(self.span) {
      return EditOutcome::UNTOUCHED;
    }

    tracing::trace!(span = %self.span, edit = %edit_span, "edit straddles mnemonic boundary");
    EditOutcome::ABORT
  }

  /// Exact replacement for the accumulated text, placeholder included.
  pub fn matching_symbol<'t>(&self, table: &'t AbbreviationTable) -> Option<&'t str> {
    table.exact_match(&self.text)
  }

  /// True when the accumulated text can only ever be one mnemonic and that
  /// mnemonic is already complete — the eager-replacement trigger.
  pub fn is_unique_and_complete(&self, table: &AbbreviationTable) -> bool {
    table.prefix_matches(&self.text).take(2).count() == 1
      && table.exact_match(&self.text).is_some()
  }
}

/// Replace `count` chars of `text` starting at char offset `at` with
/// `replacement`. Offsets are char-based; the mnemonic itself is ASCII but
/// an absorbed edit may carry arbitrary text.
fn splice(text: &mut Tendril, at: usize, count: usize, replacement: &str) {
  let start = byte_of_char(text, at);
  let end = byte_of_char(text, at + count);
  text.replace_range(start..end, replacement);
}

fn byte_of_char(text: &str, char_idx: usize) -> usize {
  text
    .char_indices()
    .nth(char_idx)
    .map(|(idx, _)| idx)
    .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn table() -> AbbreviationTable {
    let mut table = AbbreviationTable::new();
    table.insert("alpha", "α");
    table.insert("all", "∀");
    table.insert("to", "→");
    table
  }

  fn typed(table: &AbbreviationTable, text: &str) -> TrackedAbbreviation {
    let mut abbr = TrackedAbbreviation::new(1);
    for (i, ch) in text.chars().enumerate() {
      let outcome = abbr.process_edit(table, Span::point(1 + i), &ch.to_string());
      assert!(outcome.affected);
    }
    abbr
  }

  #[test]
  fn appends_absorb_while_a_mnemonic_is_possible() {
    let table = table();
    let abbr = typed(&table, "alp");
    assert_eq!(abbr.text(), "alp");
    assert_eq!(abbr.span(), Span::new(1, 3));
    assert_eq!(abbr.replaceable_span(), Span::new(0, 4));
    assert!(!abbr.is_finished());
  }

  #[test]
  fn dead_end_append_is_not_absorbed() {
    let table = table();
    let mut abbr = typed(&table, "al");

    let outcome = abbr.process_edit(&table, Span::point(3), "z");
    assert_eq!(outcome, EditOutcome::UNTOUCHED);
    assert!(abbr.is_finished());
    assert_eq!(abbr.text(), "al");
    assert_eq!(abbr.span(), Span::new(1, 2));
  }

  #[test]
  fn interior_edit_splices_and_clears_finished() {
    let table = table();
    let mut abbr = typed(&table, "al");
    abbr.process_edit(&table, Span::point(3), "z"); // now finished

    // Backspace the 'l'; the mnemonic is live again.
    let outcome = abbr.process_edit(&table, Span::new(2, 1), "");
    assert_eq!(outcome, EditOutcome::ABSORBED);
    assert!(!abbr.is_finished());
    assert_eq!(abbr.text(), "a");
    assert_eq!(abbr.span(), Span::new(1, 1));

    // Interior insertion right after the leader.
    let outcome = abbr.process_edit(&table, Span::point(1), "t");
    assert_eq!(outcome, EditOutcome::ABSORBED);
    assert_eq!(abbr.text(), "ta");
  }

  #[test]
  fn preceding_edit_translates() {
    let table = table();
    let mut abbr = typed(&table, "to");

    let outcome = abbr.process_edit(&table, Span::point(0), "xyz");
    assert_eq!(outcome, EditOutcome::UNTOUCHED);
    assert_eq!(abbr.span(), Span::new(4, 2));
    assert_eq!(abbr.text(), "to");

    let outcome = abbr.process_edit(&table, Span::new(0, 2), "");
    assert_eq!(outcome, EditOutcome::UNTOUCHED);
    assert_eq!(abbr.span(), Span::new(2, 2));
  }

  #[test]
  fn following_edit_is_ignored() {
    let table = table();
    let mut abbr = typed(&table, "to");

    let outcome = abbr.process_edit(&table, Span::new(5, 3), "whatever");
    assert_eq!(outcome, EditOutcome::UNTOUCHED);
    assert_eq!(abbr.span(), Span::new(1, 2));
  }

  #[test]
  fn straddling_edit_aborts() {
    let table = table();
    let mut abbr = typed(&table, "alp");

    // Deletes the leader and the first mnemonic char.
    let outcome = abbr.process_edit(&table, Span::new(0, 2), "");
    assert_eq!(outcome, EditOutcome::ABORT);

    // Overlaps the tail and text beyond it.
    let mut abbr = typed(&table, "alp");
    let outcome = abbr.process_edit(&table, Span::new(3, 4), "x");
    assert_eq!(outcome, EditOutcome::ABORT);
  }

  #[test]
  fn unique_and_complete() {
    let table = table();
    assert!(typed(&table, "to").is_unique_and_complete(&table));
    // "al" prefixes both "all" and "alpha".
    assert!(!typed(&table, "al").is_unique_and_complete(&table));
    // "all" is the only mnemonic starting with "all", and it is complete.
    assert!(typed(&table, "all").is_unique_and_complete(&table));
    // Empty text matches every prefix.
    assert!(!TrackedAbbreviation::new(1).is_unique_and_complete(&table));
  }

  #[test]
  fn matching_symbol_is_exact_only() {
    let table = table();
    assert_eq!(typed(&table, "to").matching_symbol(&table), Some("→"));
    assert_eq!(typed(&table, "t").matching_symbol(&table), None);
  }

  #[test]
  fn multi_char_interior_replacement_is_absorbed() {
    let table = table();
    let mut abbr = typed(&table, "al");
    let outcome = abbr.process_edit(&table, Span::new(2, 1), "lph");
    assert_eq!(outcome, EditOutcome::ABSORBED);
    assert_eq!(abbr.text(), "alph");
    assert_eq!(abbr.span(), Span::new(1, 4));
  }
}
