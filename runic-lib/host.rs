//! The seam between the rewriter and whatever owns the buffer.
//!
//! The engine never touches an editor directly: it is handed a [`Host`]
//! (buffer mutation + selections) and a [`DecorationSink`] (underlines and
//! the "abbreviation input active" flag) at construction, and that is the
//! whole contract. Dropping the rewriter is the disposal handle — nothing
//! is registered globally.

use runic_core::span::Span;
use smallvec::SmallVec;
use thiserror::Error;

use crate::Tendril;

/// The current cursor/selection set; zero-length spans are plain carets.
pub type Selections = SmallVec<[Span; 1]>;

/// One raw buffer edit as delivered by the host, span in pre-edit
/// coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
  pub span: Span,
  pub text: Tendril,
}

impl Edit {
  pub fn new(span: Span, text: impl Into<Tendril>) -> Self {
    Self {
      span,
      text: text.into(),
    }
  }

  pub fn text_len(&self) -> usize {
    self.text.chars().count()
  }

  /// Net change in buffer length, in chars.
  pub fn len_delta(&self) -> isize {
    self.text_len() as isize - self.span.length as isize
  }
}

/// One span rewrite of a flush transaction: replace `span` with `text` and,
/// if a caret was inside, park it `cursor` chars into the insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
  pub span:   Span,
  pub text:   Tendril,
  pub cursor: usize,
}

impl Replacement {
  pub fn text_len(&self) -> usize {
    self.text.chars().count()
  }

  pub fn len_delta(&self) -> isize {
    self.text_len() as isize - self.span.length as isize
  }
}

/// The host refused the edit transaction, typically because the buffer
/// changed concurrently. Recoverable: the rewrite is simply lost.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("host rejected the edit transaction")]
pub struct EditRejected;

/// Buffer access the rewriter needs from the editor host.
pub trait Host {
  /// Apply all replacements as one atomic transaction against the current
  /// buffer state. Spans are in pre-transaction coordinates. All-or-nothing:
  /// a rejection must leave the buffer untouched.
  fn apply_edits(&mut self, replacements: &[Replacement]) -> Result<(), EditRejected>;

  fn selections(&self) -> Selections;

  fn set_selections(&mut self, selections: Selections);
}

/// Rendering-side effects. Both calls are idempotent, total replacements of
/// the previous state, and must be honored even when the new set is empty.
pub trait DecorationSink {
  /// Underline exactly these spans (leader-inclusive), dropping any
  /// previous underlines.
  fn set_underlines(&mut self, spans: &[Span]);

  /// Toggle the "abbreviation input in progress" flag other editor
  /// bindings key off of.
  fn set_input_active(&mut self, active: bool);
}

/// Sink for embedders without decorations.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DecorationSink for NullSink {
  fn set_underlines(&mut self, _spans: &[Span]) {}

  fn set_input_active(&mut self, _active: bool) {}
}
