// Copyright 2020 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A backward walk over the antecedents of a filled chart.
//!
//! The walk starts at the accepting entry and follows antecedents right to
//! left until it reaches the initial entry, reporting every entry it passes
//! as a `WalkEvent`. Descending into a completed nonterminal pushes the item
//! waiting for it onto a return stack; reaching the start of that
//! nonterminal pops it again to find the call site.
//!
//! Where an entry has several antecedents the walk records a backtrack
//! point, follows the first antecedent, and later comes back to try the
//! others. Each such leg is announced with a `Backtrack` event and only
//! covers the part of the derivation below the backtrack point; the part
//! above it was already reported by the first leg.
//!
//! An end entry seen for the second time is reported as a `Revisit` and not
//! descended into again, which keeps the walk finite for cyclic grammars and
//! lets consumers share the subtree.

use {
  crate::{
    gfg::{Gfg, Vertex, VertexId},
    grammar::Elem,
    parsers::chart::{Chart, EntryId},
  },
  im::Vector,
  std::collections::BTreeSet,
};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum EventKind {
  Visit,
  Revisit,
  Backtrack,
}

/// One step of a backward walk: what happened, at which entry, in which
/// chart column.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct WalkEvent {
  pub kind: EventKind,
  pub entry: EntryId,
  pub column: usize,
}

#[derive(Clone, Debug)]
struct BacktrackPoint {
  entry: EntryId,
  column: usize,
  return_stack: Vector<EntryId>,
  next_antecedent: usize,
}

#[derive(Copy, Clone, Debug)]
enum Cursor {
  At(EntryId),
  Done,
}

/// A pull iterator over the events of a backward walk.
///
/// A walk cannot be resumed once abandoned; create a new walker to walk
/// again.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct BackwardWalker<'a> {
  #[derivative(Debug = "ignore")]
  gfg: &'a Gfg,
  #[derivative(Debug = "ignore")]
  chart: &'a Chart,
  cursor: Cursor,
  column: usize,
  visited: BTreeSet<EntryId>,
  return_stack: Vector<EntryId>,
  backtracks: Vec<BacktrackPoint>,
  leg_floor: usize,
}

impl<'a> BackwardWalker<'a> {
  pub fn new(gfg: &'a Gfg, chart: &'a Chart, accepting: EntryId) -> Self {
    BackwardWalker {
      gfg,
      chart,
      cursor: Cursor::At(accepting),
      column: chart.entry(accepting).column(),
      visited: BTreeSet::new(),
      return_stack: Vector::new(),
      backtracks: Vec::new(),
      leg_floor: 0,
    }
  }

  /// Depth of the return stack, i.e. how many callers the walk is currently
  /// nested in.
  pub fn depth(&self) -> usize {
    self.return_stack.len()
  }

  fn vertex_of(&self, id: EntryId) -> VertexId {
    self.chart.entry(id).vertex()
  }

  fn entry_at(&self, vertex: VertexId, origin: usize, column: usize) -> EntryId {
    self.chart.find(vertex, origin, column).unwrap_or_else(|| {
      panic!(
        "walk reached {} from {} in column {}, but the chart has no such entry",
        self.gfg.vertex_label(vertex),
        origin,
        column
      )
    })
  }

  /// Moves to `choice` from `entry`, which has several antecedents.
  fn branch(&mut self, entry: EntryId, choice_index: usize) -> EntryId {
    self.backtracks.push(BacktrackPoint {
      entry,
      column: self.column,
      return_stack: self.return_stack.clone(),
      next_antecedent: choice_index + 1,
    });
    self.chart.entry(entry).antecedents()[choice_index]
  }

  fn step_end(&mut self, id: EntryId) -> WalkEvent {
    let column = self.column;
    if !self.visited.insert(id) {
      // Shared: jump straight to the matching start and leave it.
      let origin = self.chart.entry(id).origin();
      self.column = origin;
      self.leave_start();
      return self.event(EventKind::Revisit, id, column);
    }

    let chart = self.chart;
    let entry = chart.entry(id);
    self.cursor = Cursor::At(if entry.has_multiple_antecedents() {
      self.branch(id, 0)
    } else {
      entry.antecedents()[0]
    });
    self.event(EventKind::Visit, id, column)
  }

  fn step_start(&mut self, id: EntryId) -> WalkEvent {
    let kind = if self.visited.insert(id) {
      EventKind::Visit
    } else {
      EventKind::Revisit
    };
    let column = self.column;
    self.leave_start();
    self.event(kind, id, column)
  }

  fn step_item(&mut self, id: EntryId) -> WalkEvent {
    let (gfg, chart) = (self.gfg, self.chart);
    let column = self.column;
    let entry = chart.entry(id);
    let vertex = entry.vertex();
    let origin = entry.origin();

    let next = match gfg.prev_elem(vertex) {
      None => {
        let start = gfg
          .start_vertex(gfg.head_of(vertex))
          .expect("every nonterminal has a start vertex");
        self.entry_at(start, origin, column)
      }
      Some(Elem::Term(_)) => {
        let prev = gfg.prev_item(vertex).expect("item after a terminal");
        self.column -= 1;
        self.entry_at(prev, origin, self.column)
      }
      Some(Elem::NonTerm(_)) => {
        let callee_end = if entry.has_multiple_antecedents() {
          self.branch(id, 0)
        } else {
          entry.antecedents()[0]
        };
        self.return_stack.push_back(id);
        callee_end
      }
    };

    self.cursor = Cursor::At(next);
    self.event(EventKind::Visit, id, column)
  }

  /// Leaves the start entry in the current column: back to the call site
  /// recorded on the return stack, or on to the next leg.
  fn leave_start(&mut self) {
    if self.return_stack.len() <= self.leg_floor {
      self.cursor = Cursor::Done;
      return;
    }

    let returned = self
      .return_stack
      .pop_back()
      .expect("return stack is above the leg floor");
    let returned_entry = self.chart.entry(returned);
    let call_site = self
      .gfg
      .prev_item(returned_entry.vertex())
      .expect("a returned item follows a nonterminal");
    let caller_origin = returned_entry.origin();
    self.cursor =
      Cursor::At(self.entry_at(call_site, caller_origin, self.column));
  }

  /// Resumes the most recent backtrack point with an untried antecedent.
  fn backtrack(&mut self) -> Option<WalkEvent> {
    let chart = self.chart;
    loop {
      let point = self.backtracks.last_mut()?;
      let antecedents = chart.entry(point.entry).antecedents();
      if point.next_antecedent >= antecedents.len() {
        self.backtracks.pop();
        continue;
      }

      let choice = antecedents[point.next_antecedent];
      point.next_antecedent += 1;
      let entry = point.entry;
      let column = point.column;

      self.column = column;
      self.return_stack = point.return_stack.clone();
      self.leg_floor = self.return_stack.len();
      if self.gfg.vertex(self.vertex_of(entry)).as_item().is_some() {
        self.return_stack.push_back(entry);
      }
      self.cursor = Cursor::At(choice);
      return Some(self.event(EventKind::Backtrack, entry, column));
    }
  }

  fn event(&self, kind: EventKind, entry: EntryId, column: usize) -> WalkEvent {
    log::trace!(
      "{:?} {} at {}",
      kind,
      self.gfg.vertex_label(self.vertex_of(entry)),
      column
    );
    WalkEvent {
      kind,
      entry,
      column,
    }
  }
}

impl Iterator for BackwardWalker<'_> {
  type Item = WalkEvent;

  fn next(&mut self) -> Option<WalkEvent> {
    let id = match self.cursor {
      Cursor::At(id) => id,
      Cursor::Done => return self.backtrack(),
    };

    Some(match self.gfg.vertex(self.vertex_of(id)) {
      Vertex::End(_) => self.step_end(id),
      Vertex::Start(_) => self.step_start(id),
      Vertex::Item(_) => self.step_item(id),
    })
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    grammar::{examples, Grammar, Terminal},
    parsers::{Parsing, Recognizer, Token},
  };

  fn tokens(kinds: &[&str]) -> Vec<Token> {
    kinds
      .iter()
      .map(|kind| Token::new(Terminal::new(kind), *kind))
      .collect()
  }

  fn walk(parsing: &Parsing) -> Vec<(EventKind, String, usize)> {
    let gfg = parsing.gfg();
    parsing
      .walker()
      .map(|event| {
        let vertex = parsing.chart().entry(event.entry).vertex();
        (event.kind, gfg.vertex_label(vertex), event.column)
      })
      .collect()
  }

  fn with_parsing<R>(
    grammar: Grammar,
    input: &[&str],
    f: impl FnOnce(&Parsing) -> R,
  ) -> R {
    let gfg = Gfg::new(grammar);
    let parsing = Recognizer::new(&gfg).parse(tokens(input)).unwrap();
    f(&parsing)
  }

  #[test]
  fn test_walk_abc() {
    let events = with_parsing(examples::make_abc(), &["a", "b", "c"], walk);
    let expected = vec![
      (EventKind::Visit, "S•", 3),
      (EventKind::Visit, "S => <A> •", 3),
      (EventKind::Visit, "A•", 3),
      (EventKind::Visit, "A => a <A> c •", 3),
      (EventKind::Visit, "A => a <A> • c", 2),
      (EventKind::Visit, "A•", 2),
      (EventKind::Visit, "A => b •", 2),
      (EventKind::Visit, "A => • b", 1),
      (EventKind::Visit, "•A", 1),
      (EventKind::Visit, "A => a • <A> c", 1),
      (EventKind::Visit, "A => • a <A> c", 0),
      (EventKind::Visit, "•A", 0),
      (EventKind::Visit, "S => • <A>", 0),
      (EventKind::Visit, "•S", 0),
    ];
    let expected = expected
      .into_iter()
      .map(|(kind, label, column)| (kind, label.to_string(), column))
      .collect::<Vec<_>>();
    assert_eq!(events, expected);
  }

  #[test]
  fn test_shared_nullable_is_revisited() {
    let events = with_parsing(examples::make_nullable_pair(), &["x"], walk);
    let kinds = events
      .iter()
      .filter(|(_, label, _)| label == "A•")
      .map(|(kind, _, _)| *kind)
      .collect::<Vec<_>>();
    assert_eq!(kinds, vec![EventKind::Visit, EventKind::Revisit]);
    assert!(events.iter().all(|(kind, _, _)| *kind != EventKind::Backtrack));
    assert_eq!(events.last().unwrap().1, "•Ss");
  }

  #[test]
  fn test_backtracks_over_productions() {
    let events = with_parsing(
      examples::make_ambiguous_expression(),
      &["integer", "+", "integer", "*", "integer"],
      walk,
    );
    let backtracks = events
      .iter()
      .filter(|(kind, _, _)| *kind == EventKind::Backtrack)
      .collect::<Vec<_>>();
    assert_eq!(backtracks.len(), 1);
    assert_eq!(backtracks[0].1, "S•");
    assert_eq!(backtracks[0].2, 5);

    // The second leg ends at the start of S without climbing further.
    assert_eq!(events.last().unwrap().1, "•S");
  }

  #[test]
  fn test_backtracks_over_split_points() {
    let events = with_parsing(
      examples::make_split_ambiguity(),
      &["a", "a", "a"],
      walk,
    );
    let backtracks = events
      .iter()
      .filter(|(kind, _, _)| *kind == EventKind::Backtrack)
      .map(|(_, label, column)| (label.as_str(), *column))
      .collect::<Vec<_>>();
    assert_eq!(backtracks, vec![("S => <A> <A> •", 3)]);
  }

  #[test]
  fn test_cyclic_walk_terminates() {
    let events = with_parsing(examples::make_cyclic(), &["a"], walk);
    assert!(events.iter().any(|(kind, _, _)| *kind == EventKind::Revisit));
    assert!(events.len() < 20);
  }

  #[test]
  fn test_walk_is_repeatable() {
    with_parsing(
      examples::make_ambiguous_expression(),
      &["integer", "*", "integer", "+", "integer", "*", "integer"],
      |parsing| {
        assert_eq!(walk(parsing), walk(parsing));
      },
    );
  }
}
