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

//! An Earley recognizer driven by a GFG.
//!
//! Each column of the chart is saturated with the call, start, exit and end
//! rules before the scan rule moves on to the next column. Every push
//! records the entry that triggered it, so that the derivations can be
//! recovered afterwards by walking backwards from the accepting entry.

use {
  crate::{
    gfg::{Gfg, Vertex, VertexId},
    grammar::{Elem, NonTerminal, ReturnContext, Terminal},
    parsers::{
      chart::{Chart, EntryId},
      forest::{Forest, ForestBuilder},
      tree::{ParseTree, TreeBuilder, TreeError},
      walker::BackwardWalker,
      ParseError, Token,
    },
  },
  std::{
    collections::{BTreeMap, BTreeSet},
    ops::Range,
  },
};

/// Recognizes token sequences against a borrowed `Gfg`.
#[derive(Copy, Clone, Debug)]
pub struct Recognizer<'g> {
  gfg: &'g Gfg,
}

impl<'g> Recognizer<'g> {
  pub fn new(gfg: &'g Gfg) -> Self {
    Recognizer { gfg }
  }

  /// Fills a chart for `tokens`. On success the returned `Parsing` owns the
  /// chart and can extract trees and forests from it.
  pub fn parse<I>(&self, tokens: I) -> Result<Parsing<'g>, ParseError>
  where
    I: IntoIterator<Item = Token>,
  {
    let tokens = tokens.into_iter().collect::<Vec<_>>();
    let mut chart = Chart::new(tokens.len() + 1);
    chart.push(self.gfg, self.gfg.initial_vertex(), 0, 0, None);

    for position in 0..=tokens.len() {
      self.saturate(&mut chart, &tokens, position);
      log::debug!(
        "Column {} holds {} entries",
        position,
        chart.column(position).len()
      );

      if position < tokens.len() {
        self.scan(&mut chart, &tokens, position)?;
      }
    }

    let last = tokens.len();
    match chart.find(self.gfg.accepting_vertex(), 0, last) {
      Some(accepting) => Ok(Parsing {
        gfg: self.gfg,
        tokens,
        chart,
        accepting,
      }),
      None if tokens.is_empty() => {
        log::debug!("Empty input rejected");
        Err(ParseError::NoInput)
      }
      None => {
        log::debug!("Input ended before the start symbol completed");
        Err(ParseError::PrematureInputEnd {
          position: last - 1,
          last_token: tokens[last - 1].clone(),
          expected: expected_at(&chart, last),
        })
      }
    }
  }

  fn saturate(&self, chart: &mut Chart, tokens: &[Token], position: usize) {
    let mut next = 0;
    while next < chart.column(position).len() {
      let id = chart.column(position).entries()[next];
      next += 1;

      let (vertex, origin) = {
        let entry = chart.entry(id);
        (entry.vertex(), entry.origin())
      };

      match self.gfg.vertex(vertex) {
        Vertex::Start(_) => {
          debug_assert_eq!(origin, position);
          for target in self.gfg.epsilon_targets(vertex) {
            log::trace!("start: {}", self.gfg.vertex_label(target));
            chart.push(self.gfg, target, position, position, Some(id));
          }
        }
        Vertex::End(nt) => {
          let callers = chart.entries_awaiting_nonterm(nt, origin).to_vec();
          for caller in callers {
            self.apply_return(chart, tokens, caller, id, position);
          }
        }
        Vertex::Item(item) if item.is_complete() => {
          let end = self.end_of(self.gfg.head_of(vertex));
          log::trace!("exit: {}", self.gfg.vertex_label(vertex));
          chart.push(self.gfg, end, origin, position, Some(id));
        }
        Vertex::Item(_) => {
          if let Some(Elem::NonTerm(callee)) = self.gfg.next_elem(vertex) {
            let start = self.start_of(callee);
            log::trace!("call: <{}> at {}", callee, position);
            chart.push(self.gfg, start, position, position, Some(id));

            // A nullable callee may already have completed in this column
            // before this caller arrived.
            let end = self.end_of(callee);
            if let Some(completed) = chart.find(end, position, position) {
              self.apply_return(chart, tokens, id, completed, position);
            }
          }
        }
      }
    }
  }

  fn apply_return(
    &self,
    chart: &mut Chart,
    tokens: &[Token],
    caller: EntryId,
    completed: EntryId,
    position: usize,
  ) {
    let (caller_vertex, call_origin) = {
      let entry = chart.entry(caller);
      (entry.vertex(), entry.origin())
    };
    let callee_origin = chart.entry(completed).origin();
    let target = self
      .gfg
      .return_target(caller_vertex)
      .expect("caller entry must expect a nonterminal");

    let prod = self
      .gfg
      .prod_of(caller_vertex)
      .expect("caller entry must be an item");
    if let Some(constraint) = prod.constraint() {
      let elem_index = self
        .gfg
        .vertex(caller_vertex)
        .as_item()
        .map(|item| item.dot())
        .unwrap_or_default();
      let callee = self.gfg.head_of(chart.entry(completed).vertex());
      let context = ReturnContext {
        prod,
        elem_index,
        callee,
        call_origin,
        callee_origin,
        position,
        tokens,
      };
      if !constraint.permits(&context) {
        log::trace!(
          "return vetoed: {} over [{}, {})",
          self.gfg.vertex_label(caller_vertex),
          callee_origin,
          position
        );
        return;
      }
    }

    log::trace!("return: {}", self.gfg.vertex_label(target));
    chart.push(self.gfg, target, call_origin, position, Some(completed));
  }

  fn scan(
    &self,
    chart: &mut Chart,
    tokens: &[Token],
    position: usize,
  ) -> Result<(), ParseError> {
    let token = &tokens[position];
    let waiting = chart
      .entries_awaiting_terminal(token.kind(), position)
      .to_vec();

    if waiting.is_empty() {
      log::debug!(
        "No entry awaits '{}' at position {}",
        token.kind(),
        position
      );
      return Err(ParseError::UnexpectedToken {
        position,
        last_token: token.clone(),
        expected: expected_at(chart, position),
      });
    }

    for id in waiting {
      let (vertex, origin) = {
        let entry = chart.entry(id);
        (entry.vertex(), entry.origin())
      };
      let target = self
        .gfg
        .scan_target(vertex, token.kind())
        .expect("entry awaiting a terminal must have a scan edge");
      log::trace!("scan: {}", self.gfg.vertex_label(target));
      chart.push(self.gfg, target, origin, position + 1, Some(id));
    }
    Ok(())
  }

  fn start_of(&self, nt: &NonTerminal) -> VertexId {
    self
      .gfg
      .start_vertex(nt)
      .expect("every nonterminal has a start vertex")
  }

  fn end_of(&self, nt: &NonTerminal) -> VertexId {
    self
      .gfg
      .end_vertex(nt)
      .expect("every nonterminal has an end vertex")
  }
}

fn expected_at(chart: &Chart, position: usize) -> BTreeSet<Terminal> {
  chart.column(position).expected_terminals().cloned().collect()
}

/// The result of a successful recognition.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Parsing<'g> {
  #[derivative(Debug = "ignore")]
  gfg: &'g Gfg,
  tokens: Vec<Token>,
  #[derivative(Debug = "ignore")]
  chart: Chart,
  accepting: EntryId,
}

impl<'g> Parsing<'g> {
  pub fn gfg(&self) -> &'g Gfg {
    self.gfg
  }

  pub fn tokens(&self) -> &[Token] {
    &self.tokens
  }

  pub fn chart(&self) -> &Chart {
    &self.chart
  }

  /// The `(End(start symbol), 0)` entry of the last column.
  pub fn accepting_entry(&self) -> EntryId {
    self.accepting
  }

  /// The token range covered by the whole parse.
  pub fn range(&self) -> Range<usize> {
    0..self.chart.last_non_empty_index().unwrap_or(0)
  }

  /// Returns true if some part of the input has more than one derivation.
  ///
  /// Complete items of each column are grouped by head and origin; a group
  /// with more than one member means that the same nonterminal matched the
  /// same span through different productions. An item reached through
  /// several completed callees (different split points of its body) counts
  /// as well.
  pub fn is_ambiguous(&self) -> bool {
    for column in self.chart.columns() {
      let mut groups: BTreeMap<(&NonTerminal, usize), usize> = BTreeMap::new();
      for &id in column.entries() {
        let entry = self.chart.entry(id);
        let item = match self.gfg.vertex(entry.vertex()).as_item() {
          Some(item) => item,
          None => continue,
        };

        if !item.is_initial() && entry.has_multiple_antecedents() {
          return true;
        }
        if item.is_complete() {
          let count = groups
            .entry((self.gfg.head_of(entry.vertex()), entry.origin()))
            .or_insert(0);
          *count += 1;
          if *count > 1 {
            return true;
          }
        }
      }
    }
    false
  }

  /// A fresh backward walk from the accepting entry.
  pub fn walker(&self) -> BackwardWalker {
    BackwardWalker::new(self.gfg, &self.chart, self.accepting)
  }

  /// Extracts the single derivation of the input.
  pub fn build_tree(&self) -> Result<ParseTree, TreeError> {
    let mut builder = TreeBuilder::new(self);
    for event in self.walker() {
      builder.handle(&event)?;
    }
    builder.finish()
  }

  /// Extracts every derivation of the input as a shared forest.
  pub fn build_forest(&self) -> Forest {
    let mut builder = ForestBuilder::new(self);
    for event in self.walker() {
      builder.handle(&event);
    }
    builder.finish()
  }
}
