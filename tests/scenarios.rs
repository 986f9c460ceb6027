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

//! End to end runs through the public API.

use gfg_earley::{
  gfg::Gfg,
  grammar::{build, examples, GrammarError, NonTerminal, Terminal},
  parsers::{
    forest::ForestNode, tree::TreeNode, ForestParser, ParseError, Parser,
    Recognizer, Token, TreeParser,
  },
};

fn tokens(kinds: &[&str]) -> Vec<Token> {
  kinds
    .iter()
    .map(|kind| Token::new(Terminal::new(kind), *kind))
    .collect()
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
fn right_nested_input_gives_a_deep_tree() {
  let parser = TreeParser::new(examples::make_abc());
  let tree = parser.parse(tokens(&["a", "a", "b", "c", "c"])).unwrap();
  assert_eq!(tree.depth(), 5);

  let mut node = tree.root();
  while let Some(inner) = node
    .children()
    .iter()
    .find(|child| child.symbol().is_some())
  {
    node = inner;
  }
  assert_eq!(node.symbol(), Some(&NonTerminal::new("A")));
  assert_eq!(node.children().len(), 1);
  assert_eq!(node.children()[0].token().map(|t| t.kind()), Some(&Terminal::new("b")));
}

#[test]
fn nullable_occurrences_get_epsilon_leaves() {
  let parser = ForestParser::new(examples::make_nullable_pair());
  let forest = parser.parse(tokens(&["x"])).unwrap();

  let root = forest.node(forest.root());
  let epsilons = root
    .children()
    .filter(|&child| {
      forest
        .node(child)
        .children()
        .any(|leaf| matches!(forest.node(leaf), ForestNode::Epsilon { .. }))
    })
    .count();
  assert_eq!(epsilons, 2);
  assert!(!forest.is_ambiguous());
}

#[test]
fn multiplication_binds_tighter() {
  let parser = TreeParser::new(examples::make_expression());
  let tree = parser.parse(expr_tokens("2 + 3 * 4")).unwrap();

  // P => S; S => S + M, where M covers "3 * 4".
  let sum = &tree.root().children()[0];
  assert_eq!(sum.symbol(), Some(&NonTerminal::new("S")));
  assert_eq!(sum.children().len(), 3);
  let product = &sum.children()[2];
  assert_eq!(product.symbol(), Some(&NonTerminal::new("M")));
  assert_eq!(product.range(), 2..5);
}

#[test]
fn truncated_expression_reports_what_was_expected() {
  let parser = TreeParser::new(examples::make_expression());
  let err = parser.parse(expr_tokens("2 +")).unwrap_err();
  match err.downcast_ref::<ParseError>() {
    Some(ParseError::PrematureInputEnd { expected, .. }) => {
      assert!(expected.contains(&Terminal::new("integer")));
      assert!(expected.contains(&Terminal::new("(")));
    }
    other => panic!("unexpected result: {:?}", other),
  }
}

#[test]
fn ambiguous_expression_forest_spans_the_input() {
  let gfg = Gfg::new(examples::make_ambiguous_expression());
  let parsing = Recognizer::new(&gfg).parse(expr_tokens("2 + 3 * 4")).unwrap();
  assert!(parsing.is_ambiguous());

  let forest = parsing.build_forest();
  let root = forest.node(forest.root());
  assert_eq!(root.range(), 0..5);
  assert!(root.is_ambiguous());
  assert_eq!(root.children().count(), 2);
}

#[test]
fn parsing_is_deterministic() {
  let gfg = Gfg::new(examples::make_ambiguous_expression());
  let input = expr_tokens("1 + 2 * 3 + 4");
  let first = Recognizer::new(&gfg).parse(input.clone()).unwrap();
  let second = Recognizer::new(&gfg).parse(input).unwrap();
  assert_eq!(first.build_forest(), second.build_forest());
  assert_eq!(first.build_forest(), first.build_forest());
}

#[test]
fn tree_parser_refuses_ambiguous_input() {
  let parser = TreeParser::new(examples::make_ambiguous_expression());
  let err = parser.parse(expr_tokens("2 + 3 * 4")).unwrap_err();
  assert!(err.to_string().starts_with("ambiguous input"));
}

#[test]
fn grammar_with_undefined_nonterminal_is_rejected() {
  let s = NonTerminal::new("S");
  let missing = NonTerminal::new("Missing");
  let err = build(&s, |gb| {
    gb.add_rule(&s, |rb| {
      rb.add_prod(|pb| {
        pb.add_nonterm(&missing);
      });
    });
  })
  .unwrap_err();
  assert_eq!(
    err,
    GrammarError::UndefinedNonTerminal {
      nonterm: missing,
      referenced_by: s,
    }
  );
}

#[test]
fn one_gfg_serves_many_threads() {
  let gfg = std::sync::Arc::new(Gfg::new(examples::make_expression()));
  let handles: Vec<_> = (0..4)
    .map(|n| {
      let gfg = gfg.clone();
      std::thread::spawn(move || {
        let text = format!("{} * ( {} + 1 )", n, n);
        let parsing = Recognizer::new(&gfg).parse(expr_tokens(&text)).unwrap();
        parsing.build_tree().unwrap().depth()
      })
    })
    .collect();
  for handle in handles {
    assert!(handle.join().unwrap() > 1);
  }
}

#[test]
fn leaves_read_back_the_input() {
  let parser = TreeParser::new(examples::make_expression());
  let input = expr_tokens("( 1 + 2 ) * 3");
  let tree = parser.parse(input.clone()).unwrap();

  fn collect<'t>(node: &'t TreeNode, out: &mut Vec<&'t Token>) {
    match node.token() {
      Some(token) => out.push(token),
      None => node.children().iter().for_each(|c| collect(c, out)),
    }
  }
  let mut leaves = Vec::new();
  collect(tree.root(), &mut leaves);
  assert_eq!(leaves, input.iter().collect::<Vec<_>>());
}
