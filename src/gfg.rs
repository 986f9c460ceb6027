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

//! The Grammar Flow Graph.
//!
//! A GFG has a start vertex (`•N`) and an end vertex (`N•`) for every
//! nonterminal `N`, and an item vertex for every dot position of every
//! production. Following an edge in the graph corresponds to one step of a
//! leftmost derivation: entering a production, shifting over a terminal,
//! calling into a nonterminal, or leaving a completed production.
//!
//! The graph is built once per grammar, is immutable afterwards, and can be
//! shared between any number of concurrent parses.

use {
  crate::{
    grammar::{Elem, Grammar, NonTerminal, Prod, ProdId, Terminal},
    utils::{to_pretty_string, ToDoc},
  },
  std::{borrow::Cow, collections::BTreeMap},
};

/// The identity of a vertex within its `Gfg`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct VertexId(usize);

impl VertexId {
  pub fn index(self) -> usize {
    self.0
  }
}

/// A production with a dot position in `0..=len`.
///
/// For an empty production the only item has its dot at 0 and is both
/// initial and complete.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct DottedItem {
  prod: ProdId,
  dot: usize,
  len: usize,
}

impl DottedItem {
  pub fn prod(&self) -> ProdId {
    self.prod
  }

  pub fn dot(&self) -> usize {
    self.dot
  }

  /// Returns true if no element precedes the dot.
  pub fn is_initial(&self) -> bool {
    self.dot == 0
  }

  /// Returns true if the dot is at the end of the production.
  pub fn is_complete(&self) -> bool {
    self.dot == self.len
  }

  /// Returns true if this is the item of an empty production.
  pub fn is_empty_production(&self) -> bool {
    self.len == 0
  }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Vertex {
  /// Before any production of the nonterminal (`•N`).
  Start(NonTerminal),
  /// After a completed production of the nonterminal (`N•`).
  End(NonTerminal),
  Item(DottedItem),
}

impl Vertex {
  pub fn as_item(&self) -> Option<&DottedItem> {
    match self {
      Vertex::Item(item) => Some(item),
      _ => None,
    }
  }

  pub fn is_start(&self) -> bool {
    matches!(self, Vertex::Start(_))
  }

  pub fn is_end(&self) -> bool {
    matches!(self, Vertex::End(_))
  }
}

/// An outgoing edge of a vertex.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Edge {
  /// From a start vertex to the initial item of one of its productions, or
  /// from a complete item to the end vertex of its head.
  Epsilon(VertexId),
  /// From an item expecting a nonterminal to that nonterminal's start vertex.
  Call(VertexId),
  /// From an item expecting a nonterminal to the item after it. This is the
  /// edge taken by the end rule once the callee completes.
  Return(VertexId),
  /// From an item expecting a terminal to the item after it.
  Scan { terminal: Terminal, target: VertexId },
}

impl Edge {
  pub fn target(&self) -> VertexId {
    match self {
      Edge::Epsilon(target)
      | Edge::Call(target)
      | Edge::Return(target)
      | Edge::Scan { target, .. } => *target,
    }
  }
}

/// A Grammar Flow Graph, owning the grammar it was built from.
pub struct Gfg {
  grammar: Grammar,
  vertices: Vec<Vertex>,
  edges: Vec<Vec<Edge>>,
  starts: BTreeMap<NonTerminal, VertexId>,
  ends: BTreeMap<NonTerminal, VertexId>,
  items: BTreeMap<(ProdId, usize), VertexId>,
}

impl std::fmt::Debug for Gfg {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    f.debug_struct("Gfg")
      .field("start", self.grammar.start_nt())
      .field("vertices", &self.vertices.len())
      .finish()
  }
}

impl Gfg {
  /// Builds the graph for `grammar`.
  pub fn new(grammar: Grammar) -> Self {
    let mut gfg = Gfg {
      grammar,
      vertices: Vec::new(),
      edges: Vec::new(),
      starts: BTreeMap::new(),
      ends: BTreeMap::new(),
      items: BTreeMap::new(),
    };

    let nonterms = gfg.grammar.get_nonterminals().cloned().collect::<Vec<_>>();
    for nt in nonterms {
      let start = gfg.add_vertex(Vertex::Start(nt.clone()));
      let end = gfg.add_vertex(Vertex::End(nt.clone()));
      gfg.starts.insert(nt.clone(), start);
      gfg.ends.insert(nt, end);
    }

    let prods = gfg
      .grammar
      .prods()
      .map(|prod| (prod.id(), prod.num_elements()))
      .collect::<Vec<_>>();
    for (prod, len) in prods {
      for dot in 0..=len {
        let vertex = gfg.add_vertex(Vertex::Item(DottedItem { prod, dot, len }));
        gfg.items.insert((prod, dot), vertex);
      }
    }

    gfg.add_edges();
    log::debug!(
      "Built GFG with {} vertices for {} productions",
      gfg.vertices.len(),
      gfg.grammar.prods().count()
    );
    gfg
  }

  fn add_vertex(&mut self, vertex: Vertex) -> VertexId {
    let id = VertexId(self.vertices.len());
    self.vertices.push(vertex);
    self.edges.push(Vec::new());
    id
  }

  fn add_edges(&mut self) {
    let mut new_edges = Vec::new();

    for prod in self.grammar.prods() {
      let head = prod.head();
      new_edges.push((self.starts[head], Edge::Epsilon(self.items[&(prod.id(), 0)])));

      for (dot, elem) in prod.elements().iter().enumerate() {
        let from = self.items[&(prod.id(), dot)];
        let next = self.items[&(prod.id(), dot + 1)];
        match elem {
          Elem::Term(terminal) => new_edges.push((
            from,
            Edge::Scan {
              terminal: terminal.clone(),
              target: next,
            },
          )),
          Elem::NonTerm(nt) => {
            new_edges.push((from, Edge::Call(self.starts[nt])));
            new_edges.push((from, Edge::Return(next)));
          }
        }
      }

      let last = self.items[&(prod.id(), prod.num_elements())];
      new_edges.push((last, Edge::Epsilon(self.ends[head])));
    }

    for (from, edge) in new_edges {
      self.edges[from.0].push(edge);
    }
  }

  pub fn grammar(&self) -> &Grammar {
    &self.grammar
  }

  pub fn num_vertices(&self) -> usize {
    self.vertices.len()
  }

  pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> {
    self
      .vertices
      .iter()
      .enumerate()
      .map(|(index, vertex)| (VertexId(index), vertex))
  }

  pub fn vertex(&self, id: VertexId) -> &Vertex {
    &self.vertices[id.0]
  }

  /// Returns the outgoing edges of a vertex.
  pub fn edges(&self, id: VertexId) -> &[Edge] {
    &self.edges[id.0]
  }

  pub fn start_vertex(&self, nt: &NonTerminal) -> Option<VertexId> {
    self.starts.get(nt).copied()
  }

  pub fn end_vertex(&self, nt: &NonTerminal) -> Option<VertexId> {
    self.ends.get(nt).copied()
  }

  pub fn item_vertex(&self, prod: ProdId, dot: usize) -> Option<VertexId> {
    self.items.get(&(prod, dot)).copied()
  }

  /// The start vertex of the grammar's start symbol.
  pub fn initial_vertex(&self) -> VertexId {
    self.starts[self.grammar.start_nt()]
  }

  /// The end vertex of the grammar's start symbol.
  pub fn accepting_vertex(&self) -> VertexId {
    self.ends[self.grammar.start_nt()]
  }

  /// The production an item vertex belongs to.
  pub fn prod_of(&self, id: VertexId) -> Option<Prod> {
    self
      .vertex(id)
      .as_item()
      .map(|item| self.grammar.prod(item.prod))
  }

  /// The nonterminal a vertex belongs to: the symbol of a start or end vertex,
  /// or the head of an item's production.
  pub fn head_of(&self, id: VertexId) -> &NonTerminal {
    match self.vertex(id) {
      Vertex::Start(nt) | Vertex::End(nt) => nt,
      Vertex::Item(item) => self.grammar.prod(item.prod).head(),
    }
  }

  /// The element right after the dot of an item vertex.
  pub fn next_elem(&self, id: VertexId) -> Option<&Elem> {
    let item = self.vertex(id).as_item()?;
    self.grammar.prod(item.prod).element_at(item.dot)
  }

  /// The element right before the dot of an item vertex.
  pub fn prev_elem(&self, id: VertexId) -> Option<&Elem> {
    let item = self.vertex(id).as_item()?;
    if item.dot == 0 {
      return None;
    }
    self.grammar.prod(item.prod).element_at(item.dot - 1)
  }

  /// The item vertex with the dot one position further left.
  pub fn prev_item(&self, id: VertexId) -> Option<VertexId> {
    let item = self.vertex(id).as_item()?;
    if item.dot == 0 {
      return None;
    }
    self.item_vertex(item.prod, item.dot - 1)
  }

  pub fn call_target(&self, id: VertexId) -> Option<VertexId> {
    self.edges(id).iter().find_map(|edge| match edge {
      Edge::Call(target) => Some(*target),
      _ => None,
    })
  }

  pub fn return_target(&self, id: VertexId) -> Option<VertexId> {
    self.edges(id).iter().find_map(|edge| match edge {
      Edge::Return(target) => Some(*target),
      _ => None,
    })
  }

  /// The item reached from `id` by shifting over `terminal`, if any.
  pub fn scan_target(&self, id: VertexId, terminal: &Terminal) -> Option<VertexId> {
    self.edges(id).iter().find_map(|edge| match edge {
      Edge::Scan { terminal: t, target } if t == terminal => Some(*target),
      _ => None,
    })
  }

  /// Targets of the epsilon edges leaving a vertex.
  pub fn epsilon_targets(&self, id: VertexId) -> impl Iterator<Item = VertexId> + '_ {
    self.edges(id).iter().filter_map(|edge| match edge {
      Edge::Epsilon(target) => Some(*target),
      _ => None,
    })
  }

  /// A human readable label, e.g. `A => a • <A> c`, `•A` or `A•`.
  pub fn vertex_label(&self, id: VertexId) -> String {
    to_pretty_string(&VertexDoc { gfg: self, id }, 120)
  }

  /// Renders the graph in graphviz format.
  pub fn to_dot(&self) -> String {
    let mut out = Vec::new();
    dot::render(self, &mut out).expect("writing to a Vec cannot fail");
    String::from_utf8_lossy(&out).into_owned()
  }
}

struct VertexDoc<'a> {
  gfg: &'a Gfg,
  id: VertexId,
}

impl ToDoc for VertexDoc<'_> {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    match self.gfg.vertex(self.id) {
      Vertex::Start(nt) => da.text("•").append(nt.to_doc(da)),
      Vertex::End(nt) => nt.to_doc(da).append(da.text("•")),
      Vertex::Item(item) => {
        let prod = self.gfg.grammar.prod(item.prod);
        let elems = prod.elements();
        let before = elems[..item.dot].iter().map(|e| e.to_doc(da));
        let after = elems[item.dot..].iter().map(|e| e.to_doc(da));
        let body = before
          .chain(std::iter::once(da.text("•")))
          .chain(after);
        prod
          .head()
          .to_doc(da)
          .append(da.text(" =>"))
          .append(da.text(" "))
          .append(da.intersperse(body, da.text(" ")))
      }
    }
  }
}

/// An edge as seen by the graphviz renderer.
#[derive(Clone)]
pub struct DotEdge {
  from: VertexId,
  edge: Edge,
}

impl<'a> dot::Labeller<'a, VertexId, DotEdge> for Gfg {
  fn graph_id(&'a self) -> dot::Id<'a> {
    dot::Id::new("gfg").expect("valid graph id")
  }

  fn node_id(&'a self, n: &VertexId) -> dot::Id<'a> {
    dot::Id::new(format!("v{}", n.0)).expect("valid node id")
  }

  fn node_label(&'a self, n: &VertexId) -> dot::LabelText<'a> {
    dot::LabelText::LabelStr(Cow::Owned(self.vertex_label(*n)))
  }

  fn edge_label(&'a self, e: &DotEdge) -> dot::LabelText<'a> {
    let label = match &e.edge {
      Edge::Epsilon(_) => "ε".to_string(),
      Edge::Call(_) => "call".to_string(),
      Edge::Return(_) => "return".to_string(),
      Edge::Scan { terminal, .. } => terminal.to_string(),
    };
    dot::LabelText::LabelStr(Cow::Owned(label))
  }
}

impl<'a> dot::GraphWalk<'a, VertexId, DotEdge> for Gfg {
  fn nodes(&'a self) -> dot::Nodes<'a, VertexId> {
    Cow::Owned((0..self.vertices.len()).map(VertexId).collect())
  }

  fn edges(&'a self) -> dot::Edges<'a, DotEdge> {
    Cow::Owned(
      self
        .vertices()
        .flat_map(|(from, _)| {
          Gfg::edges(self, from)
            .iter()
            .map(move |edge| DotEdge {
              from,
              edge: edge.clone(),
            })
        })
        .collect(),
    )
  }

  fn source(&'a self, edge: &DotEdge) -> VertexId {
    edge.from
  }

  fn target(&'a self, edge: &DotEdge) -> VertexId {
    edge.edge.target()
  }
}
