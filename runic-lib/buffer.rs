//! In-memory reference host.
//!
//! [`BufferHost`] is a minimal editor document — a rope plus a selection
//! set — implementing [`Host`]. The integration tests drive the full
//! typing loop through it, and embedders without their own buffer (REPLs,
//! prompt widgets) can use it directly. All offsets are char offsets.

use ropey::Rope;
use runic_core::span::Span;
use smallvec::smallvec;

use crate::host::{
  Edit,
  EditRejected,
  Host,
  Replacement,
  Selections,
};

#[derive(Debug, Clone)]
pub struct BufferHost {
  text:       Rope,
  selections: Selections,
}

impl BufferHost {
  /// A buffer over `text` with a single caret at offset 0.
  pub fn new(text: &str) -> Self {
    Self {
      text:       Rope::from(text),
      selections: smallvec![Span::point(0)],
    }
  }

  pub fn text(&self) -> &Rope {
    &self.text
  }

  pub fn contents(&self) -> String {
    self.text.to_string()
  }

  pub fn len_chars(&self) -> usize {
    self.text.len_chars()
  }

  pub fn set_caret(&mut self, offset: usize) {
    self.selections = smallvec![Span::point(offset)];
  }

  pub fn set_carets(&mut self, offsets: &[usize]) {
    self.selections = offsets.iter().map(|offset| Span::point(*offset)).collect();
  }

  /// The single caret position, if the selection set is exactly one caret.
  pub fn caret(&self) -> Option<usize> {
    match self.selections.as_slice() {
      [span] if span.is_empty() => Some(span.offset),
      _ => None,
    }
  }

  /// Type `text` at every selection, replacing selected content, the way
  /// an editor would. Returns the edit batch in pre-edit coordinates —
  /// exactly what the host delivers to the rewriter for this transaction.
  pub fn type_str(&mut self, text: &str) -> Vec<Edit> {
    let mut targets = self.selections.clone();
    targets.sort_by_key(|span| span.offset);

    let edits: Vec<Edit> = targets
      .iter()
      .map(|span| Edit::new(*span, text))
      .collect();

    for edit in edits.iter().rev() {
      self.replace_span(edit.span, text);
    }

    // Each caret lands after its own insertion, shifted by every earlier
    // edit's delta.
    let inserted = text.chars().count();
    let mut delta = 0isize;
    self.selections = edits
      .iter()
      .map(|edit| {
        let caret = (edit.span.offset as isize + delta) as usize + inserted;
        delta += edit.len_delta();
        Span::point(caret)
      })
      .collect();

    edits
  }

  /// Apply one programmatic edit (a paste, another plugin, ...) and return
  /// it for delivery. Carets at or past the edited region slide with it.
  pub fn edit(&mut self, span: Span, text: &str) -> Edit {
    let edit = Edit::new(span, text);
    self.replace_span(span, text);

    let delta = edit.len_delta();
    for selection in &mut self.selections {
      if selection.offset >= span.end() {
        *selection = selection.translate(delta);
      }
    }

    edit
  }

  fn replace_span(&mut self, span: Span, text: &str) {
    self.text.remove(span.offset..span.end());
    self.text.insert(span.offset, text);
  }
}

impl Host for BufferHost {
  fn apply_edits(&mut self, replacements: &[Replacement]) -> Result<(), EditRejected> {
    let mut ordered: Vec<&Replacement> = replacements.iter().collect();
    ordered.sort_by(|a, b| b.span.offset.cmp(&a.span.offset));

    // Validate the whole transaction before touching the rope; a rejection
    // must leave the buffer untouched.
    let len = self.text.len_chars();
    let mut previous_start = usize::MAX;
    for replacement in &ordered {
      if replacement.span.end() > len || replacement.span.end() > previous_start {
        return Err(EditRejected);
      }
      previous_start = replacement.span.offset;
    }

    for replacement in ordered {
      self.replace_span(replacement.span, &replacement.text);
    }

    Ok(())
  }

  fn selections(&self) -> Selections {
    self.selections.clone()
  }

  fn set_selections(&mut self, selections: Selections) {
    self.selections = selections;
  }
}
