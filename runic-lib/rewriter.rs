//! Event routing and the atomic flush.
//!
//! A [`Rewriter`] owns every in-progress abbreviation for one buffer. The
//! host feeds it two event streams — buffer changes and selection changes —
//! and it autonomously decides when an abbreviation is done, then rewrites
//! the buffer in one transaction while re-deriving every cursor position.
//!
//! # Event routing
//!
//! Buffer-change batches arrive with all spans in pre-edit coordinates.
//! They are processed tail-to-head (descending offset) so that applying
//! them one at a time against the tracked spans never invalidates an
//! offset a later edit still needs. Each raw edit can touch at most one
//! tracked abbreviation — tracked spans are pairwise disjoint, which is a
//! maintained invariant here, not an assumption.
//!
//! A fresh abbreviation starts when an edit inserts exactly the leader
//! character and no existing tracker absorbed it.
//!
//! # Flush
//!
//! Flushing removes the chosen trackers from the live set *first*, then
//! resolves their symbols, remaps every selection through the replacement
//! set, and applies the whole rewrite as one atomic host transaction.
//! Trackers with no matching symbol are dropped silently — their underline
//! disappears on the next decoration refresh and the buffer keeps whatever
//! the user typed.
//!
//! # Re-entrancy
//!
//! The rewrite issued by a flush is itself a buffer edit, and hosts
//! typically also collapse selections while applying it. Interpreting
//! either as fresh typing would re-trigger tracking on our own output, so
//! both entry points check [`RewriterState`]: while `ApplyingOwnEdit` the
//! events are dropped. The surviving trackers still have to slide across
//! the rewrite, which the flush does itself after a successful apply —
//! remove-before-edit plus the state guard is what makes the cycle safe.

use std::sync::Arc;

use runic_core::span::Span;
use smallvec::SmallVec;

use crate::{
  config::AbbreviationConfig,
  host::{
    DecorationSink,
    Edit,
    Host,
    Replacement,
    Selections,
  },
  table::{
    AbbreviationTable,
    resolve_placeholder,
  },
  tracking::TrackedAbbreviation,
};

/// Controller state machine. The rewriter refuses to interpret its own
/// programmatic rewrite as user input; `ApplyingOwnEdit` covers the window
/// in which the host may deliver echoes of that rewrite.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RewriterState {
  #[default]
  Idle,
  ApplyingOwnEdit,
}

/// Abbreviation rewriter for a single buffer.
pub struct Rewriter<H: Host, D: DecorationSink> {
  host:    H,
  sink:    D,
  table:   Arc<AbbreviationTable>,
  config:  AbbreviationConfig,
  tracked: Vec<TrackedAbbreviation>,
  state:   RewriterState,
}

impl<H: Host, D: DecorationSink> Rewriter<H, D> {
  pub fn new(host: H, sink: D, table: Arc<AbbreviationTable>, config: AbbreviationConfig) -> Self {
    let mut rewriter = Self {
      host,
      sink,
      table,
      config,
      tracked: Vec::new(),
      state: RewriterState::default(),
    };
    rewriter.refresh_decorations();
    rewriter
  }

  pub fn host(&self) -> &H {
    &self.host
  }

  pub fn host_mut(&mut self) -> &mut H {
    &mut self.host
  }

  pub fn sink(&self) -> &D {
    &self.sink
  }

  pub fn table(&self) -> &AbbreviationTable {
    &self.table
  }

  pub fn config(&self) -> &AbbreviationConfig {
    &self.config
  }

  pub fn tracked(&self) -> impl ExactSizeIterator<Item = &TrackedAbbreviation> {
    self.tracked.iter()
  }

  /// One atomic document transaction from the host, spans in pre-edit
  /// coordinates.
  pub fn on_buffer_changed(&mut self, edits: &[Edit]) {
    if self.state == RewriterState::ApplyingOwnEdit {
      tracing::trace!("ignoring own edit echo");
      return;
    }

    // Tail-to-head, so earlier edits' offsets stay valid while later
    // (higher) ones are absorbed.
    let mut ordered: SmallVec<[&Edit; 4]> = edits.iter().collect();
    ordered.sort_by(|a, b| b.span.offset.cmp(&a.span.offset));

    for edit in ordered {
      self.process_one_edit(edit);
    }

    self.refresh_decorations();

    let table = Arc::clone(&self.table);
    let eager = self.config.eager_replacement;
    self.flush_where(move |abbr| {
      abbr.is_finished() || (eager && abbr.is_unique_and_complete(&table))
    });
  }

  /// Current cursor/selection set from the host. An abbreviation whose
  /// leader-inclusive span no longer holds any caret is committed or
  /// dropped: the user has moved on.
  pub fn on_selections_changed(&mut self, selections: &[Span]) {
    if self.state == RewriterState::ApplyingOwnEdit {
      tracing::trace!("ignoring own selection echo");
      return;
    }

    let carets: SmallVec<[Span; 1]> = selections
      .iter()
      .copied()
      .filter(|selection| selection.is_empty())
      .collect();

    self.flush_where(move |abbr| {
      !carets
        .iter()
        .any(|caret| abbr.replaceable_span().contains(*caret))
    });
  }

  /// Commit every tracked abbreviation right now — the manual trigger for
  /// a "force replace" keybinding.
  pub fn replace_all(&mut self) {
    self.flush_where(|_| true);
  }

  fn process_one_edit(&mut self, edit: &Edit) {
    let mut affected: SmallVec<[usize; 2]> = SmallVec::new();

    let mut index = 0;
    while index < self.tracked.len() {
      let outcome = self.tracked[index].process_edit(&self.table, edit.span, &edit.text);
      if outcome.stop_tracking {
        self.tracked.remove(index);
        continue;
      }
      if outcome.affected {
        affected.push(index);
      }
      index += 1;
    }

    // Disjoint spans mean a single raw edit can only ever land in one
    // tracker; anything else is a logic error upstream.
    if affected.len() > 1 {
      debug_assert!(
        false,
        "edit {} absorbed by {} trackers",
        edit.span,
        affected.len()
      );
      tracing::warn!(
        edit = %edit.span,
        count = affected.len(),
        "edit absorbed by multiple trackers; dropping all of them"
      );
      for index in affected.iter().rev() {
        self.tracked.remove(*index);
      }
      affected.clear();
    }

    if affected.is_empty() && self.is_leader_insertion(edit) {
      tracing::trace!(at = edit.span.offset, "tracking new abbreviation");
      self
        .tracked
        .push(TrackedAbbreviation::new(edit.span.offset + 1));
      self.enforce_disjoint();
    }
  }

  fn is_leader_insertion(&self, edit: &Edit) -> bool {
    let mut chars = edit.text.chars();
    chars.next() == Some(self.config.leader) && chars.next().is_none()
  }

  /// Keep the tracked set sorted and pairwise disjoint, dropping the later
  /// of any overlapping pair.
  fn enforce_disjoint(&mut self) {
    self.tracked.sort_by_key(|abbr| abbr.span().offset);

    let mut index = 1;
    while index < self.tracked.len() {
      let previous = self.tracked[index - 1].span();
      let current = self.tracked[index].span();
      if !previous.is_before(current) {
        debug_assert!(false, "overlapping trackers {previous} and {current}");
        tracing::warn!(%previous, %current, "overlapping trackers; dropping the later one");
        self.tracked.remove(index);
        continue;
      }
      index += 1;
    }
  }

  /// Split off every tracker matching `pred` and flush them as one
  /// transaction.
  fn flush_where(&mut self, mut pred: impl FnMut(&TrackedAbbreviation) -> bool) {
    let mut flushing = Vec::new();
    let mut index = 0;
    while index < self.tracked.len() {
      if pred(&self.tracked[index]) {
        flushing.push(self.tracked.remove(index));
      } else {
        index += 1;
      }
    }
    self.flush(flushing);
  }

  /// Commit a set of abbreviations that has already been removed from the
  /// live set. Replacing before removing would let the rewrite itself be
  /// mistaken for fresh typing of the same mnemonics.
  fn flush(&mut self, abbrs: Vec<TrackedAbbreviation>) {
    if abbrs.is_empty() {
      return;
    }

    let mut replacements: Vec<Replacement> = abbrs
      .iter()
      .filter_map(|abbr| {
        let Some(symbol) = abbr.matching_symbol(&self.table) else {
          tracing::debug!(text = abbr.text(), "no symbol for mnemonic; dropping");
          return None;
        };
        let insertion = resolve_placeholder(symbol);
        Some(Replacement {
          span:   abbr.replaceable_span(),
          text:   insertion.text,
          cursor: insertion.cursor,
        })
      })
      .collect();

    if replacements.is_empty() {
      self.refresh_decorations();
      return;
    }

    replacements.sort_by(|a, b| b.span.offset.cmp(&a.span.offset));
    tracing::debug!(count = replacements.len(), "applying abbreviation rewrite");

    self.state = RewriterState::ApplyingOwnEdit;

    let remapped: Selections = self
      .host
      .selections()
      .iter()
      .map(|selection| remap_selection(*selection, &replacements))
      .collect();

    match self.host.apply_edits(&replacements) {
      Ok(()) => {
        self.slide_survivors(&replacements);
        self.host.set_selections(remapped);
      },
      Err(rejected) => {
        // Recoverable: the mnemonics are gone from tracking either way,
        // the user keeps the literal text and can retype. Selections are
        // deliberately left exactly as they were.
        tracing::warn!(%rejected, dropped = abbrs.len(), "abbreviation rewrite not applied");
      },
    }

    self.state = RewriterState::Idle;
    self.refresh_decorations();
  }

  /// Route our own rewrite through the surviving trackers, the same way a
  /// host-delivered edit batch would be — every replacement is disjoint
  /// from every survivor, so they only ever translate.
  fn slide_survivors(&mut self, replacements: &[Replacement]) {
    let table = Arc::clone(&self.table);
    for replacement in replacements {
      let mut index = 0;
      while index < self.tracked.len() {
        let outcome =
          self.tracked[index].process_edit(&table, replacement.span, &replacement.text);
        debug_assert!(!outcome.affected, "rewrite landed inside a survivor");
        if outcome.stop_tracking || outcome.affected {
          self.tracked.remove(index);
          continue;
        }
        index += 1;
      }
    }
  }

  fn refresh_decorations(&mut self) {
    let spans: SmallVec<[Span; 4]> = self
      .tracked
      .iter()
      .map(|abbr| abbr.replaceable_span())
      .collect();
    self.sink.set_underlines(&spans);
    self.sink.set_input_active(!self.tracked.is_empty());
  }
}

/// Remap one selection through a descending-sorted replacement set. A
/// selection inside (or at the edges of) a replaced span collapses to that
/// replacement's cursor position; a selection past a replaced span slides
/// by its length delta; a selection before it is untouched.
fn remap_selection(mut selection: Span, replacements: &[Replacement]) -> Span {
  for replacement in replacements {
    if replacement.span.contains(selection) || overlaps(replacement.span, selection) {
      selection = Span::point(replacement.span.offset + replacement.cursor);
    } else if replacement.span.is_before(selection) {
      selection = selection.translate(replacement.len_delta());
    }
  }
  selection
}

fn overlaps(a: Span, b: Span) -> bool {
  a.offset < b.end() && b.offset < a.end()
}
