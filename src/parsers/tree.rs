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

use {
  crate::{
    gfg::{Gfg, Vertex},
    grammar::{Elem, NonTerminal, ProdId},
    parsers::{
      chart::{Chart, EntryId},
      visitor::ParseVisitor,
      walker::{EventKind, WalkEvent},
      Parsing, Token,
    },
    utils::{to_pretty_string, ToDoc},
  },
  std::{collections::BTreeMap, ops::Range},
};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
  #[error("ambiguous input: <{symbol}> over tokens {range:?} has more than one derivation")]
  Ambiguous {
    symbol: NonTerminal,
    range: Range<usize>,
  },
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TreeNode {
  Token {
    index: usize,
    token: Token,
  },
  Epsilon {
    position: usize,
  },
  NonTerminal {
    symbol: NonTerminal,
    prod: ProdId,
    range: Range<usize>,
    children: Vec<TreeNode>,
  },
}

impl TreeNode {
  pub fn symbol(&self) -> Option<&NonTerminal> {
    match self {
      TreeNode::NonTerminal { symbol, .. } => Some(symbol),
      _ => None,
    }
  }

  pub fn prod(&self) -> Option<ProdId> {
    match self {
      TreeNode::NonTerminal { prod, .. } => Some(*prod),
      _ => None,
    }
  }

  pub fn range(&self) -> Range<usize> {
    match self {
      TreeNode::Token { index, .. } => *index..index + 1,
      TreeNode::Epsilon { position } => *position..*position,
      TreeNode::NonTerminal { range, .. } => range.clone(),
    }
  }

  pub fn children(&self) -> &[TreeNode] {
    match self {
      TreeNode::NonTerminal { children, .. } => children,
      _ => &[],
    }
  }

  pub fn token(&self) -> Option<&Token> {
    match self {
      TreeNode::Token { token, .. } => Some(token),
      _ => None,
    }
  }

  /// The number of nodes on the longest root to leaf path.
  pub fn depth(&self) -> usize {
    1 + self.children().iter().map(TreeNode::depth).max().unwrap_or(0)
  }

  fn accept<V: ParseVisitor>(&self, visitor: &mut V) {
    match self {
      TreeNode::Token { index, token } => visitor.visit_token(*index, token),
      TreeNode::Epsilon { position } => visitor.visit_epsilon(*position),
      TreeNode::NonTerminal {
        symbol,
        range,
        children,
        ..
      } => {
        visitor.enter_nonterminal(symbol, range);
        for child in children {
          child.accept(visitor);
        }
        visitor.exit_nonterminal(symbol, range);
      }
    }
  }
}

impl ToDoc for TreeNode {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    match self {
      TreeNode::Token { token, .. } => da.text(token.lexeme().str().to_string()),
      TreeNode::Epsilon { .. } => da.text("ε"),
      TreeNode::NonTerminal {
        symbol, children, ..
      } => da
        .text("(")
        .append(symbol.to_doc(da))
        .append(
          da.line()
            .append(da.intersperse(children.iter().map(|c| c.to_doc(da)), da.line()))
            .nest(2),
        )
        .append(da.text(")"))
        .group(),
    }
  }
}

/// A single derivation of the input.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ParseTree {
  root: TreeNode,
}

impl ParseTree {
  pub fn root(&self) -> &TreeNode {
    &self.root
  }

  pub fn depth(&self) -> usize {
    self.root.depth()
  }

  /// Walks the tree depth first, children left to right.
  pub fn accept<V: ParseVisitor>(&self, visitor: &mut V) {
    self.root.accept(visitor);
  }

  /// Renders the tree as a bracketed expression, e.g. `(S (A a (A b) c))`.
  pub fn to_pretty(&self) -> String {
    to_pretty_string(&self.root, 80)
  }
}

// ----------------

struct PartialNode {
  symbol: NonTerminal,
  prod: Option<ProdId>,
  range: Range<usize>,
  end: EntryId,
  // Collected right to left.
  children: Vec<TreeNode>,
}

/// Assembles a `ParseTree` from the events of a backward walk.
///
/// Fails with `TreeError::Ambiguous` as soon as the walk shows more than one
/// derivation.
pub struct TreeBuilder<'p> {
  gfg: &'p Gfg,
  chart: &'p Chart,
  tokens: &'p [Token],
  stack: Vec<PartialNode>,
  finished: BTreeMap<EntryId, TreeNode>,
  root: Option<TreeNode>,
}

impl<'p> TreeBuilder<'p> {
  pub fn new(parsing: &'p Parsing) -> Self {
    TreeBuilder {
      gfg: parsing.gfg(),
      chart: parsing.chart(),
      tokens: parsing.tokens(),
      stack: Vec::new(),
      finished: BTreeMap::new(),
      root: None,
    }
  }

  fn ambiguity(&self, event: &WalkEvent) -> TreeError {
    let entry = self.chart.entry(event.entry);
    TreeError::Ambiguous {
      symbol: self.gfg.head_of(entry.vertex()).clone(),
      range: entry.origin()..event.column,
    }
  }

  pub fn handle(&mut self, event: &WalkEvent) -> Result<(), TreeError> {
    let (gfg, chart) = (self.gfg, self.chart);
    let entry = chart.entry(event.entry);

    match (event.kind, gfg.vertex(entry.vertex())) {
      (EventKind::Backtrack, _) => return Err(self.ambiguity(event)),
      (EventKind::Visit, Vertex::End(nt)) => {
        if entry.has_multiple_antecedents() {
          return Err(self.ambiguity(event));
        }
        self.stack.push(PartialNode {
          symbol: nt.clone(),
          prod: None,
          range: entry.origin()..event.column,
          end: event.entry,
          children: Vec::new(),
        });
      }
      (EventKind::Revisit, Vertex::End(_)) => {
        // Only a node that is already complete can be reused; anything else
        // is a derivation that contains itself.
        let node = self
          .finished
          .get(&event.entry)
          .cloned()
          .ok_or_else(|| self.ambiguity(event))?;
        self.attach(node);
      }
      (_, Vertex::Start(_)) => {
        let partial = self
          .stack
          .pop()
          .expect("start of a nonterminal that was never entered");
        let mut children = partial.children;
        children.reverse();
        let node = TreeNode::NonTerminal {
          symbol: partial.symbol,
          prod: partial.prod.expect("a completed node has a production"),
          range: partial.range,
          children,
        };
        self.finished.insert(partial.end, node.clone());
        self.attach(node);
      }
      (_, Vertex::Item(item)) => {
        if entry.has_multiple_antecedents() {
          return Err(self.ambiguity(event));
        }
        if item.is_complete() {
          if let Some(top) = self.stack.last_mut() {
            top.prod.get_or_insert(item.prod());
          }
        }
        match gfg.prev_elem(entry.vertex()) {
          Some(Elem::Term(_)) => {
            let index = event.column - 1;
            self.attach(TreeNode::Token {
              index,
              token: self.tokens[index].clone(),
            });
          }
          None if item.is_empty_production() => {
            self.attach(TreeNode::Epsilon {
              position: event.column,
            });
          }
          _ => {}
        }
      }
    }
    Ok(())
  }

  fn attach(&mut self, node: TreeNode) {
    match self.stack.last_mut() {
      Some(parent) => parent.children.push(node),
      None => self.root = Some(node),
    }
  }

  pub fn finish(self) -> Result<ParseTree, TreeError> {
    let root = self.root.expect("a walk always closes the accepting entry");
    Ok(ParseTree { root })
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

  fn tree_of(grammar: Grammar, input: Vec<Token>) -> Result<ParseTree, TreeError> {
    let gfg = Gfg::new(grammar);
    let parsing = Recognizer::new(&gfg).parse(input).unwrap();
    parsing.build_tree()
  }

  fn expr_tokens(text: &str) -> Vec<Token> {
    text
      .split_whitespace()
      .map(|lexeme| {
        let kind = match lexeme {
          "+" | "*" | "(" | ")" => lexeme,
          _ => "integer",
        };
        Token::new(Terminal::new(kind), lexeme)
      })
      .collect()
  }

  #[test]
  fn test_right_nested_tree() {
    let tree = tree_of(examples::make_abc(), tokens(&["a", "a", "b", "c", "c"])).unwrap();
    assert_eq!(tree.depth(), 5);
    assert_eq!(tree.to_pretty(), "(S (A a (A a (A b) c) c))");

    let innermost = &tree.root().children()[0].children()[1].children()[1];
    assert_eq!(innermost.symbol(), Some(&NonTerminal::new("A")));
    assert_eq!(innermost.range(), 2..3);
    assert_eq!(
      innermost.children()[0].token().map(|t| t.lexeme().str()),
      Some("b")
    );
  }

  #[test]
  fn test_precedence() {
    let tree = tree_of(examples::make_expression(), expr_tokens("2 + 3 * 4")).unwrap();
    assert_eq!(
      tree.to_pretty(),
      "(P (S (S (M (T 2))) + (M (M (T 3)) * (T 4))))"
    );
  }

  #[test]
  fn test_parenthesized() {
    let tree = tree_of(examples::make_expression(), expr_tokens("( 2 + 3 ) * 4")).unwrap();
    assert_eq!(
      tree.to_pretty(),
      "(P (S (M (M (T ( (S (S (M (T 2))) + (M (T 3))) ))) * (T 4))))"
    );
  }

  #[test]
  fn test_shared_nullable_is_copied() {
    let tree = tree_of(examples::make_nullable_pair(), tokens(&["x"])).unwrap();
    assert_eq!(tree.to_pretty(), "(Ss (A ε) (A ε) x)");
    assert_eq!(tree.root().children()[0], tree.root().children()[1]);
  }

  #[test]
  fn test_left_recursion() {
    let tree = tree_of(examples::make_left_recursive(), tokens(&["a", "a", "a"])).unwrap();
    assert_eq!(tree.to_pretty(), "(S (S (S a) a) a)");
  }

  #[test]
  fn test_ambiguous_productions_rejected() {
    let err = tree_of(
      examples::make_ambiguous_expression(),
      expr_tokens("2 + 3 * 4"),
    )
    .unwrap_err();
    assert_eq!(
      err,
      TreeError::Ambiguous {
        symbol: NonTerminal::new("S"),
        range: 0..5,
      }
    );
  }

  #[test]
  fn test_ambiguous_split_rejected() {
    let err = tree_of(examples::make_split_ambiguity(), tokens(&["a", "a", "a"])).unwrap_err();
    assert!(err.to_string().contains("<S>"), "got: {}", err);
  }

  #[test]
  fn test_constrained_dangling_else() {
    let input = tokens(&[
      "if", "cond", "then", "if", "cond", "then", "other", "else", "other",
    ]);
    let tree = tree_of(examples::make_dangling_else(true), input).unwrap();
    assert_eq!(
      tree.to_pretty(),
      "(S if (E cond) then (S if (E cond) then (S other) else (S other)))"
    );
  }
}
