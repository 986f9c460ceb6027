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

//! Shared packed parse forests.
//!
//! A forest holds every derivation of a parse. Nonterminal nodes are shared
//! by symbol and token range, so a sub-derivation used in many places is
//! stored once. A nonterminal with more than one derivation is marked
//! ambiguous and its children are `Alternative` nodes, each holding one
//! complete child sequence.

use {
  crate::{
    gfg::{DottedItem, Gfg, Vertex},
    grammar::{Elem, NonTerminal, ProdId},
    parsers::{
      chart::{Chart, EntryId, ParseEntry},
      visitor::ParseVisitor,
      walker::{EventKind, WalkEvent},
      Parsing, Token,
    },
  },
  im::Vector,
  std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet},
    ops::Range,
  },
};

/// The identity of a node within its `Forest`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(usize);

impl NodeId {
  pub fn index(self) -> usize {
    self.0
  }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ForestNode {
  /// The input token at `index`.
  Token { index: usize, token: Token },
  /// An empty derivation at `position`.
  Epsilon { position: usize },
  NonTerminal {
    symbol: NonTerminal,
    range: Range<usize>,
    children: Vector<NodeId>,
    /// When set, every child is an `Alternative`.
    ambiguous: bool,
  },
  /// One derivation of an ambiguous nonterminal.
  Alternative {
    symbol: NonTerminal,
    prod: ProdId,
    range: Range<usize>,
    children: Vector<NodeId>,
  },
}

impl ForestNode {
  pub fn symbol(&self) -> Option<&NonTerminal> {
    match self {
      ForestNode::NonTerminal { symbol, .. }
      | ForestNode::Alternative { symbol, .. } => Some(symbol),
      _ => None,
    }
  }

  pub fn range(&self) -> Range<usize> {
    match self {
      ForestNode::Token { index, .. } => *index..index + 1,
      ForestNode::Epsilon { position } => *position..*position,
      ForestNode::NonTerminal { range, .. }
      | ForestNode::Alternative { range, .. } => range.clone(),
    }
  }

  pub fn is_ambiguous(&self) -> bool {
    matches!(self, ForestNode::NonTerminal { ambiguous: true, .. })
  }

  fn child_list(&self) -> Option<&Vector<NodeId>> {
    match self {
      ForestNode::NonTerminal { children, .. }
      | ForestNode::Alternative { children, .. } => Some(children),
      _ => None,
    }
  }

  fn child_list_mut(&mut self) -> Option<&mut Vector<NodeId>> {
    match self {
      ForestNode::NonTerminal { children, .. }
      | ForestNode::Alternative { children, .. } => Some(children),
      _ => None,
    }
  }

  pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
    self.child_list().into_iter().flatten().copied()
  }
}

/// A parse forest: an arena of nodes and the root nonterminal.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Forest {
  nodes: Vec<ForestNode>,
  root: NodeId,
}

impl Forest {
  pub fn root(&self) -> NodeId {
    self.root
  }

  pub fn node(&self, id: NodeId) -> &ForestNode {
    &self.nodes[id.0]
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &ForestNode)> {
    self
      .nodes
      .iter()
      .enumerate()
      .map(|(index, node)| (NodeId(index), node))
  }

  /// Looks up the shared nonterminal node for `symbol` over `range`.
  pub fn find(&self, symbol: &NonTerminal, range: Range<usize>) -> Option<NodeId> {
    self.nodes().find_map(|(id, node)| match node {
      ForestNode::NonTerminal {
        symbol: s,
        range: r,
        ..
      } if s == symbol && *r == range => Some(id),
      _ => None,
    })
  }

  /// Returns true if the forest holds more than one derivation.
  pub fn is_ambiguous(&self) -> bool {
    self
      .nodes
      .iter()
      .any(|node| matches!(node, ForestNode::Alternative { .. }))
  }

  /// Walks the forest depth first from the root. A shared node is walked
  /// once per parent; a nonterminal met again below itself is reported to
  /// `ParseVisitor::cycle` instead.
  pub fn accept<V: ParseVisitor>(&self, visitor: &mut V) {
    let mut on_path = BTreeSet::new();
    self.accept_node(self.root, visitor, &mut on_path);
  }

  fn accept_node<V: ParseVisitor>(
    &self,
    id: NodeId,
    visitor: &mut V,
    on_path: &mut BTreeSet<NodeId>,
  ) {
    match self.node(id) {
      ForestNode::Token { index, token } => visitor.visit_token(*index, token),
      ForestNode::Epsilon { position } => visitor.visit_epsilon(*position),
      ForestNode::NonTerminal {
        symbol,
        range,
        children,
        ..
      } => {
        if !on_path.insert(id) {
          visitor.cycle(symbol, range);
          return;
        }
        visitor.enter_nonterminal(symbol, range);
        for child in children {
          self.accept_node(*child, visitor, on_path);
        }
        visitor.exit_nonterminal(symbol, range);
        on_path.remove(&id);
      }
      ForestNode::Alternative {
        symbol,
        prod,
        range,
        children,
      } => {
        visitor.enter_alternative(symbol, *prod, range);
        for child in children {
          self.accept_node(*child, visitor, on_path);
        }
        visitor.exit_alternative(symbol, *prod, range);
      }
    }
  }

  fn label(&self, id: NodeId) -> String {
    match self.node(id) {
      ForestNode::Token { token, .. } => token.lexeme().to_string(),
      ForestNode::Epsilon { .. } => "ε".to_string(),
      ForestNode::NonTerminal { symbol, range, .. } => {
        format!("{} [{}, {})", symbol, range.start, range.end)
      }
      ForestNode::Alternative { symbol, prod, .. } => {
        format!("{} #{}", symbol, prod.index())
      }
    }
  }

  /// Renders the forest in graphviz format.
  pub fn to_dot(&self) -> String {
    let mut out = Vec::new();
    dot::render(self, &mut out).expect("writing to a Vec cannot fail");
    String::from_utf8_lossy(&out).into_owned()
  }
}

/// A parent to child link as seen by the graphviz renderer.
#[derive(Copy, Clone, Debug)]
pub struct ForestEdge {
  parent: NodeId,
  child: NodeId,
}

impl<'a> dot::Labeller<'a, NodeId, ForestEdge> for Forest {
  fn graph_id(&'a self) -> dot::Id<'a> {
    dot::Id::new("forest").expect("valid graph id")
  }

  fn node_id(&'a self, n: &NodeId) -> dot::Id<'a> {
    dot::Id::new(format!("n{}", n.0)).expect("valid node id")
  }

  fn node_label(&'a self, n: &NodeId) -> dot::LabelText<'a> {
    dot::LabelText::LabelStr(Cow::Owned(self.label(*n)))
  }
}

impl<'a> dot::GraphWalk<'a, NodeId, ForestEdge> for Forest {
  fn nodes(&'a self) -> dot::Nodes<'a, NodeId> {
    Cow::Owned((0..self.nodes.len()).map(NodeId).collect())
  }

  fn edges(&'a self) -> dot::Edges<'a, ForestEdge> {
    Cow::Owned(
      Forest::nodes(self)
        .flat_map(|(parent, node)| {
          node.children().map(move |child| ForestEdge { parent, child })
        })
        .collect(),
    )
  }

  fn source(&'a self, edge: &ForestEdge) -> NodeId {
    edge.parent
  }

  fn target(&'a self, edge: &ForestEdge) -> NodeId {
    edge.child
  }
}

// ----------------

#[derive(Clone, Debug)]
struct Snapshot {
  path: Vec<NodeId>,
  children: Vector<NodeId>,
}

/// Assembles a `Forest` from the events of a backward walk.
pub struct ForestBuilder<'p> {
  gfg: &'p Gfg,
  chart: &'p Chart,
  tokens: &'p [Token],
  nodes: Vec<ForestNode>,
  shared: BTreeMap<(NonTerminal, usize, usize), NodeId>,
  token_nodes: BTreeMap<usize, NodeId>,
  path: Vec<NodeId>,
  snapshots: BTreeMap<EntryId, Snapshot>,
  root: Option<NodeId>,
}

impl<'p> ForestBuilder<'p> {
  pub fn new(parsing: &'p Parsing) -> Self {
    ForestBuilder {
      gfg: parsing.gfg(),
      chart: parsing.chart(),
      tokens: parsing.tokens(),
      nodes: Vec::new(),
      shared: BTreeMap::new(),
      token_nodes: BTreeMap::new(),
      path: Vec::new(),
      snapshots: BTreeMap::new(),
      root: None,
    }
  }

  pub fn handle(&mut self, event: &WalkEvent) {
    let (gfg, chart) = (self.gfg, self.chart);
    let entry = chart.entry(event.entry);

    match (event.kind, gfg.vertex(entry.vertex())) {
      (EventKind::Visit, Vertex::End(nt)) => {
        let id = self.nonterminal(nt, entry.origin()..event.column);
        self.attach(id);
        self.path.push(id);
        if entry.has_multiple_antecedents() {
          if let ForestNode::NonTerminal { ambiguous, .. } = &mut self.nodes[id.0] {
            *ambiguous = true;
          }
          self.save(event.entry, Vector::new());
        }
      }
      (EventKind::Revisit, Vertex::End(nt)) => {
        let id = self.nonterminal(nt, entry.origin()..event.column);
        self.attach(id);
      }
      (_, Vertex::Start(_)) => self.close(),
      (EventKind::Backtrack, Vertex::End(_)) => {
        let snapshot = self.snapshot(event.entry);
        self.path = snapshot.path;
      }
      (EventKind::Backtrack, Vertex::Item(item)) => {
        let snapshot = self.snapshot(event.entry);
        self.path = snapshot.path;
        let alt = self.alternative(item.prod(), snapshot.children);
        self.path.push(alt);
      }
      (_, Vertex::Item(item)) => self.visit_item(event, entry, item),
    }
  }

  fn visit_item(&mut self, event: &WalkEvent, entry: &ParseEntry, item: &DottedItem) {
    let vertex = entry.vertex();

    if item.is_complete() && self.top_is_ambiguous() {
      let alt = self.alternative(item.prod(), Vector::new());
      self.path.push(alt);
    }

    match self.gfg.prev_elem(vertex) {
      Some(Elem::Term(_)) => {
        let leaf = self.token(event.column - 1);
        self.attach(leaf);
      }
      Some(Elem::NonTerm(_)) => {
        if entry.has_multiple_antecedents() {
          let alt = self.split(item.prod());
          let children = self.nodes[alt.0]
            .child_list()
            .cloned()
            .unwrap_or_default();
          self.save(event.entry, children);
        }
      }
      None if item.is_empty_production() => {
        let leaf = self.add_node(ForestNode::Epsilon {
          position: event.column,
        });
        self.attach(leaf);
      }
      None => {}
    }
  }

  /// Makes sure the node being built has an alternative for `prod` on top
  /// of the path, converting a plain nonterminal into an ambiguous one.
  fn split(&mut self, prod: ProdId) -> NodeId {
    let top = *self.path.last().expect("an item is always inside a node");
    if let ForestNode::Alternative { .. } = self.nodes[top.0] {
      return top;
    }

    let moved = match &mut self.nodes[top.0] {
      ForestNode::NonTerminal {
        children,
        ambiguous,
        ..
      } => {
        *ambiguous = true;
        std::mem::take(children)
      }
      other => panic!("items are built inside nonterminals, found {:?}", other),
    };
    let alt = self.alternative(prod, moved);
    self.path.push(alt);
    alt
  }

  /// Saves the path below the current alternative so that a later
  /// backtrack to `entry` can resume from here.
  fn save(&mut self, entry: EntryId, children: Vector<NodeId>) {
    let mut path = self.path.clone();
    if let Some(top) = path.last() {
      if let ForestNode::Alternative { .. } = self.nodes[top.0] {
        path.pop();
      }
    }
    self.snapshots.insert(entry, Snapshot { path, children });
  }

  fn snapshot(&self, entry: EntryId) -> Snapshot {
    self
      .snapshots
      .get(&entry)
      .cloned()
      .expect("backtrack to an entry that was never visited")
  }

  fn top_is_ambiguous(&self) -> bool {
    self
      .path
      .last()
      .map(|top| self.nodes[top.0].is_ambiguous())
      .unwrap_or(false)
  }

  /// Pops the nonterminal (and its alternative, if any) being closed.
  fn close(&mut self) {
    if let Some(top) = self.path.last() {
      if let ForestNode::Alternative { .. } = self.nodes[top.0] {
        self.path.pop();
      }
    }
    self.path.pop().expect("start of a nonterminal that was never entered");
  }

  fn add_node(&mut self, node: ForestNode) -> NodeId {
    let id = NodeId(self.nodes.len());
    self.nodes.push(node);
    id
  }

  fn nonterminal(&mut self, symbol: &NonTerminal, range: Range<usize>) -> NodeId {
    let key = (symbol.clone(), range.start, range.end);
    if let Some(id) = self.shared.get(&key) {
      return *id;
    }
    let id = self.add_node(ForestNode::NonTerminal {
      symbol: symbol.clone(),
      range,
      children: Vector::new(),
      ambiguous: false,
    });
    self.shared.insert(key, id);
    id
  }

  fn token(&mut self, index: usize) -> NodeId {
    if let Some(id) = self.token_nodes.get(&index) {
      return *id;
    }
    let id = self.add_node(ForestNode::Token {
      index,
      token: self.tokens[index].clone(),
    });
    self.token_nodes.insert(index, id);
    id
  }

  /// Adds a new alternative for `prod` to the nonterminal on top of the path.
  fn alternative(&mut self, prod: ProdId, children: Vector<NodeId>) -> NodeId {
    let parent = *self.path.last().expect("alternatives belong to a node");
    let (symbol, range) = match &self.nodes[parent.0] {
      ForestNode::NonTerminal { symbol, range, .. } => (symbol.clone(), range.clone()),
      other => panic!("alternative outside of a nonterminal: {:?}", other),
    };
    let alt = self.add_node(ForestNode::Alternative {
      symbol,
      prod,
      range,
      children,
    });
    if let Some(children) = self.nodes[parent.0].child_list_mut() {
      children.push_back(alt);
    }
    alt
  }

  /// Prepends `child` to the node on top of the path, or makes it the root.
  fn attach(&mut self, child: NodeId) {
    match self.path.last() {
      Some(parent) => {
        let parent = *parent;
        if let Some(children) = self.nodes[parent.0].child_list_mut() {
          children.push_front(child);
        }
      }
      None => {
        self.root.get_or_insert(child);
      }
    }
  }

  pub fn finish(self) -> Forest {
    Forest {
      nodes: self.nodes,
      root: self.root.expect("a walk always visits the accepting entry"),
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    grammar::{examples, Grammar, Terminal},
    parsers::Recognizer,
  };

  fn tokens(kinds: &[&str]) -> Vec<Token> {
    kinds
      .iter()
      .map(|kind| Token::new(Terminal::new(kind), *kind))
      .collect()
  }

  fn forest_of(grammar: Grammar, input: &[&str]) -> Forest {
    let gfg = Gfg::new(grammar);
    let parsing = Recognizer::new(&gfg).parse(tokens(input)).unwrap();
    parsing.build_forest()
  }

  fn nt(name: &str) -> NonTerminal {
    NonTerminal::new(name)
  }

  fn alternatives(forest: &Forest, id: NodeId) -> Vec<Vec<String>> {
    forest
      .node(id)
      .children()
      .map(|alt| {
        forest
          .node(alt)
          .children()
          .map(|child| forest.label(child))
          .collect()
      })
      .collect()
  }

  #[test]
  fn test_unambiguous_forest() {
    let forest = forest_of(examples::make_abc(), &["a", "a", "b", "c", "c"]);
    assert!(!forest.is_ambiguous());
    assert_eq!(forest.node(forest.root()).symbol(), Some(&nt("S")));
    assert_eq!(forest.node(forest.root()).range(), 0..5);

    let inner = forest.find(&nt("A"), 1..4).unwrap();
    let labels = forest
      .node(inner)
      .children()
      .map(|child| forest.label(child))
      .collect::<Vec<_>>();
    assert_eq!(labels, vec!["a", "A [2, 3)", "c"]);
  }

  #[test]
  fn test_ambiguous_expression_forest() {
    let forest = forest_of(
      examples::make_ambiguous_expression(),
      &["integer", "+", "integer", "*", "integer"],
    );
    assert!(forest.is_ambiguous());

    let root = forest.node(forest.root());
    assert!(root.is_ambiguous());
    assert_eq!(root.range(), 0..5);
    assert_eq!(
      alternatives(&forest, forest.root()),
      vec![
        vec!["S [0, 3)", "*", "S [4, 5)"],
        vec!["S [0, 1)", "+", "S [2, 5)"],
      ]
    );
  }

  #[test]
  fn test_split_ambiguity() {
    let forest = forest_of(examples::make_split_ambiguity(), &["a", "a", "a"]);
    assert!(forest.node(forest.root()).is_ambiguous());
    assert_eq!(
      alternatives(&forest, forest.root()),
      vec![
        vec!["A [0, 1)", "A [1, 3)"],
        vec!["A [0, 2)", "A [2, 3)"],
      ]
    );
  }

  #[test]
  fn test_nullable_node_is_shared() {
    let forest = forest_of(examples::make_nullable_pair(), &["x"]);
    assert!(!forest.is_ambiguous());
    let a = forest.find(&nt("A"), 0..0).unwrap();
    let root_children = forest.node(forest.root()).children().collect::<Vec<_>>();
    assert_eq!(root_children.len(), 3);
    assert_eq!(root_children[0], a);
    assert_eq!(root_children[1], a);
    assert_eq!(
      forest
        .nodes()
        .filter(|(_, node)| matches!(node, ForestNode::Epsilon { .. }))
        .count(),
      1
    );
  }

  #[test]
  fn test_cyclic_forest() {
    let forest = forest_of(examples::make_cyclic(), &["a"]);
    let root = forest.root();
    assert!(forest.node(root).is_ambiguous());

    // One alternative derives the token, the other derives A itself.
    let alts = forest.node(root).children().collect::<Vec<_>>();
    assert_eq!(alts.len(), 2);
    assert_eq!(forest.node(alts[1]).children().collect::<Vec<_>>(), vec![root]);
  }

  #[test]
  fn test_rewalk_is_idempotent() {
    let gfg = Gfg::new(examples::make_ambiguous_expression());
    let parsing = Recognizer::new(&gfg)
      .parse(tokens(&[
        "integer", "+", "integer", "*", "integer", "+", "integer",
      ]))
      .unwrap();
    let first = parsing.build_forest();
    let second = parsing.build_forest();
    assert_eq!(first, second);
    assert!(first.is_ambiguous());

    // Each token leaf is stored once.
    let token_leaves = first
      .nodes()
      .filter(|(_, node)| matches!(node, ForestNode::Token { .. }))
      .count();
    assert_eq!(token_leaves, 7);
  }

  /// Counts the trees packed below `id`, checking on the way that every
  /// child sequence covers its parent's range without gaps.
  fn derivations(forest: &Forest, id: NodeId, memo: &mut BTreeMap<NodeId, u64>) -> u64 {
    if let Some(count) = memo.get(&id) {
      return *count;
    }
    let node = forest.node(id);
    let count: u64 = match node {
      ForestNode::Token { .. } | ForestNode::Epsilon { .. } => 1,
      ForestNode::NonTerminal {
        ambiguous: true, ..
      } => node
        .children()
        .map(|alt| derivations(forest, alt, memo))
        .sum(),
      _ => {
        let mut end = node.range().start;
        let mut product = 1;
        for child in node.children() {
          let range = forest.node(child).range();
          assert_eq!(range.start, end, "gap before child of {}", forest.label(id));
          end = range.end;
          product *= derivations(forest, child, memo);
        }
        assert_eq!(end, node.range().end, "children of {} stop short", forest.label(id));
        product
      }
    };
    memo.insert(id, count);
    count
  }

  fn count_derivations(grammar: Grammar, input: &[&str]) -> u64 {
    let forest = forest_of(grammar, input);
    derivations(&forest, forest.root(), &mut BTreeMap::new())
  }

  #[test]
  fn test_unambiguous_forest_has_one_derivation() {
    assert_eq!(
      count_derivations(examples::make_abc(), &["a", "a", "b", "c", "c"]),
      1
    );
    assert_eq!(
      count_derivations(examples::make_left_recursive(), &["a", "a", "a", "a"]),
      1
    );
  }

  #[test]
  fn test_nested_operator_ambiguity_counts() {
    let count = |n: usize| {
      let mut input = vec!["integer"];
      for i in 1..n {
        input.push(if i % 2 == 0 { "*" } else { "+" });
        input.push("integer");
      }
      count_derivations(examples::make_ambiguous_expression(), &input)
    };
    assert_eq!(count(2), 1);
    assert_eq!(count(3), 2);
    assert_eq!(count(4), 5);

    let sum = [
      "integer", "+", "integer", "+", "integer", "+", "integer", "+", "integer",
    ];
    assert_eq!(
      count_derivations(examples::make_ambiguous_expression(), &sum),
      14
    );
  }

  #[test]
  fn test_left_recursive_concat_counts() {
    let run = ["a"; 6];
    let counts = (1..=6)
      .map(|n| count_derivations(examples::make_binary_concat(), &run[..n]))
      .collect::<Vec<_>>();
    assert_eq!(counts, vec![1, 1, 2, 5, 14, 42]);
  }

  #[test]
  fn test_split_ambiguity_counts() {
    assert_eq!(
      count_derivations(examples::make_split_ambiguity(), &["a", "a", "a"]),
      2
    );
  }

  #[test]
  fn test_to_dot() {
    let forest = forest_of(examples::make_split_ambiguity(), &["a", "a", "a"]);
    let text = forest.to_dot();
    assert!(text.contains("digraph forest"));
    assert!(text.contains("S [0, 3)"));
  }
}
