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

//! The Earley chart: one set of parse entries per input position.

use {
  crate::{
    gfg::{Gfg, VertexId},
    grammar::{Elem, NonTerminal, Terminal},
  },
  std::collections::BTreeMap,
};

/// The identity of a parse entry within its `Chart`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct EntryId(usize);

impl EntryId {
  pub fn index(self) -> usize {
    self.0
  }
}

/// A partial match: a GFG vertex reached at some column, starting from
/// `origin`.
///
/// Entries are identified by `(vertex, origin)` within a column. Once created
/// an entry only ever gains antecedents.
#[derive(Clone, Debug)]
pub struct ParseEntry {
  vertex: VertexId,
  origin: usize,
  column: usize,
  antecedents: Vec<EntryId>,
}

impl ParseEntry {
  pub fn vertex(&self) -> VertexId {
    self.vertex
  }

  pub fn origin(&self) -> usize {
    self.origin
  }

  /// The chart column holding this entry.
  pub fn column(&self) -> usize {
    self.column
  }

  /// The entries that caused this entry to be pushed, in the order they were
  /// recorded.
  pub fn antecedents(&self) -> &[EntryId] {
    &self.antecedents
  }

  /// More than one antecedent means more than one way to reach this entry.
  pub fn has_multiple_antecedents(&self) -> bool {
    self.antecedents.len() > 1
  }

  fn add_antecedent(&mut self, antecedent: EntryId) {
    if !self.antecedents.contains(&antecedent) {
      self.antecedents.push(antecedent);
    }
  }
}

/// The entries of one chart column, in insertion order, with indices by key
/// and by expected symbol.
#[derive(Clone, Debug, Default)]
pub struct EntrySet {
  entries: Vec<EntryId>,
  by_key: BTreeMap<(VertexId, usize), EntryId>,
  awaiting_terminal: BTreeMap<Terminal, Vec<EntryId>>,
  awaiting_nonterm: BTreeMap<NonTerminal, Vec<EntryId>>,
}

impl EntrySet {
  pub fn entries(&self) -> &[EntryId] {
    &self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn get(&self, vertex: VertexId, origin: usize) -> Option<EntryId> {
    self.by_key.get(&(vertex, origin)).copied()
  }

  pub fn awaiting_terminal(&self, terminal: &Terminal) -> &[EntryId] {
    self
      .awaiting_terminal
      .get(terminal)
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  pub fn awaiting_nonterm(&self, nt: &NonTerminal) -> &[EntryId] {
    self
      .awaiting_nonterm
      .get(nt)
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  /// The terminals some entry of this column is waiting for.
  pub fn expected_terminals(&self) -> impl Iterator<Item = &Terminal> {
    self.awaiting_terminal.keys()
  }
}

/// A chart of `token count + 1` columns.
///
/// All entries live in one arena and are referred to by `EntryId`.
#[derive(Clone, Debug)]
pub struct Chart {
  entries: Vec<ParseEntry>,
  columns: Vec<EntrySet>,
}

impl Chart {
  pub fn new(num_columns: usize) -> Self {
    Chart {
      entries: Vec::new(),
      columns: vec![EntrySet::default(); num_columns],
    }
  }

  /// Pushes `(vertex, origin)` into the column at `position`, recording
  /// `antecedent` if given. Returns the entry and whether it was new.
  pub fn push(
    &mut self,
    gfg: &Gfg,
    vertex: VertexId,
    origin: usize,
    position: usize,
    antecedent: Option<EntryId>,
  ) -> (EntryId, bool) {
    assert!(
      origin <= position,
      "entry origin {} lies after its column {}",
      origin,
      position
    );

    if let Some(existing) = self.columns[position].get(vertex, origin) {
      if let Some(antecedent) = antecedent {
        self.entries[existing.0].add_antecedent(antecedent);
      }
      return (existing, false);
    }

    let id = EntryId(self.entries.len());
    self.entries.push(ParseEntry {
      vertex,
      origin,
      column: position,
      antecedents: antecedent.into_iter().collect(),
    });

    let column = &mut self.columns[position];
    column.entries.push(id);
    column.by_key.insert((vertex, origin), id);
    match gfg.next_elem(vertex) {
      Some(Elem::Term(t)) => column
        .awaiting_terminal
        .entry(t.clone())
        .or_insert_with(Vec::new)
        .push(id),
      Some(Elem::NonTerm(nt)) => column
        .awaiting_nonterm
        .entry(nt.clone())
        .or_insert_with(Vec::new)
        .push(id),
      None => {}
    }

    (id, true)
  }

  pub fn entry(&self, id: EntryId) -> &ParseEntry {
    &self.entries[id.0]
  }

  pub fn num_entries(&self) -> usize {
    self.entries.len()
  }

  pub fn num_columns(&self) -> usize {
    self.columns.len()
  }

  pub fn column(&self, position: usize) -> &EntrySet {
    &self.columns[position]
  }

  pub fn columns(&self) -> impl Iterator<Item = &EntrySet> {
    self.columns.iter()
  }

  /// Looks up the entry `(vertex, origin)` in the column at `position`.
  pub fn find(
    &self,
    vertex: VertexId,
    origin: usize,
    position: usize,
  ) -> Option<EntryId> {
    self.columns.get(position)?.get(vertex, origin)
  }

  pub fn entries_awaiting_terminal(
    &self,
    terminal: &Terminal,
    position: usize,
  ) -> &[EntryId] {
    self.columns[position].awaiting_terminal(terminal)
  }

  pub fn entries_awaiting_nonterm(
    &self,
    nt: &NonTerminal,
    position: usize,
  ) -> &[EntryId] {
    self.columns[position].awaiting_nonterm(nt)
  }

  /// The rightmost column holding at least one entry.
  pub fn last_non_empty_index(&self) -> Option<usize> {
    self.columns.iter().rposition(|column| !column.is_empty())
  }
}
