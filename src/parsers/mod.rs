// Copyright 2019 Google LLC
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

//! Recognition and parse extraction over a `Gfg`.

use crate::{
  gfg::Gfg,
  grammar::{Grammar, Terminal},
  utils::Name,
};

pub mod chart;
pub mod error;
pub mod forest;
pub mod recognizer;
pub mod tree;
pub mod visitor;
pub mod walker;

pub use {
  error::ParseError,
  forest::Forest,
  recognizer::{Parsing, Recognizer},
  tree::ParseTree,
};

/// An input token: the terminal it stands for and the text it was read from.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Token {
  kind: Terminal,
  lexeme: Name,
}

impl Token {
  pub fn new(kind: Terminal, lexeme: impl Into<Name>) -> Self {
    Token {
      kind,
      lexeme: lexeme.into(),
    }
  }

  pub fn kind(&self) -> &Terminal {
    &self.kind
  }

  pub fn lexeme(&self) -> &Name {
    &self.lexeme
  }
}

/// A parser from tokens to some parse result.
pub trait Parser {
  type Output;

  fn parse<I: IntoIterator<Item = Token>>(
    &self,
    tokens: I,
  ) -> anyhow::Result<Self::Output>;
}

/// Parses into a single tree, failing on ambiguous input.
#[derive(Debug)]
pub struct TreeParser {
  gfg: Gfg,
}

impl TreeParser {
  pub fn new(grammar: Grammar) -> Self {
    TreeParser {
      gfg: Gfg::new(grammar),
    }
  }

  pub fn gfg(&self) -> &Gfg {
    &self.gfg
  }
}

impl Parser for TreeParser {
  type Output = ParseTree;

  fn parse<I: IntoIterator<Item = Token>>(
    &self,
    tokens: I,
  ) -> anyhow::Result<ParseTree> {
    let parsing = Recognizer::new(&self.gfg).parse(tokens)?;
    Ok(parsing.build_tree()?)
  }
}

/// Parses into a forest holding every derivation.
#[derive(Debug)]
pub struct ForestParser {
  gfg: Gfg,
}

impl ForestParser {
  pub fn new(grammar: Grammar) -> Self {
    ForestParser {
      gfg: Gfg::new(grammar),
    }
  }

  pub fn gfg(&self) -> &Gfg {
    &self.gfg
  }
}

impl Parser for ForestParser {
  type Output = Forest;

  fn parse<I: IntoIterator<Item = Token>>(
    &self,
    tokens: I,
  ) -> anyhow::Result<Forest> {
    let parsing = Recognizer::new(&self.gfg).parse(tokens)?;
    Ok(parsing.build_forest())
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{grammar::examples, parsers::tree::TreeError};

  fn tokens(kinds: &[&str]) -> Vec<Token> {
    kinds
      .iter()
      .map(|kind| Token::new(Terminal::new(kind), *kind))
      .collect()
  }

  #[test]
  fn test_tree_parser() {
    let parser = TreeParser::new(examples::make_abc());
    let tree = parser.parse(tokens(&["a", "b", "c"])).unwrap();
    assert_eq!(tree.root().symbol().map(|s| s.name().str()), Some("S"));
  }

  #[test]
  fn test_tree_parser_reports_parse_errors() {
    let parser = TreeParser::new(examples::make_abc());
    let err = parser.parse(tokens(&["a", "c"])).unwrap_err();
    let parse_err = err.downcast_ref::<ParseError>().unwrap();
    assert_eq!(parse_err.position(), Some(1));
  }

  #[test]
  fn test_tree_parser_rejects_ambiguity() {
    let parser = TreeParser::new(examples::make_split_ambiguity());
    let err = parser.parse(tokens(&["a", "a", "a"])).unwrap_err();
    assert!(matches!(
      err.downcast_ref::<TreeError>(),
      Some(TreeError::Ambiguous { .. })
    ));
  }

  #[test]
  fn test_forest_parser() {
    let parser = ForestParser::new(examples::make_split_ambiguity());
    let forest = parser.parse(tokens(&["a", "a", "a"])).unwrap();
    assert!(forest.is_ambiguous());
  }
}
