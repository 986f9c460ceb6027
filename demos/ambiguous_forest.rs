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

//! Builds the forest of an ambiguous expression and prints it as an indented
//! outline, followed by its graphviz rendering.

use {
  gfg_earley::{
    grammar::{examples, NonTerminal, ProdId, Terminal},
    parsers::{visitor::ParseVisitor, ForestParser, Parser, Token},
  },
  std::ops::Range,
};

#[derive(Default)]
struct Outline {
  depth: usize,
}

impl Outline {
  fn line(&self, text: String) {
    println!("{:width$}{}", "", text, width = self.depth * 2);
  }
}

impl ParseVisitor for Outline {
  fn enter_nonterminal(&mut self, symbol: &NonTerminal, range: &Range<usize>) {
    self.line(format!("{} [{}, {})", symbol, range.start, range.end));
    self.depth += 1;
  }

  fn exit_nonterminal(&mut self, _symbol: &NonTerminal, _range: &Range<usize>) {
    self.depth -= 1;
  }

  fn enter_alternative(
    &mut self,
    _symbol: &NonTerminal,
    prod: ProdId,
    _range: &Range<usize>,
  ) {
    self.line(format!("or #{}", prod.index()));
    self.depth += 1;
  }

  fn exit_alternative(
    &mut self,
    _symbol: &NonTerminal,
    _prod: ProdId,
    _range: &Range<usize>,
  ) {
    self.depth -= 1;
  }

  fn visit_token(&mut self, _index: usize, token: &Token) {
    self.line(format!("'{}'", token.lexeme()));
  }

  fn visit_epsilon(&mut self, _position: usize) {
    self.line("ε".to_string());
  }

  fn cycle(&mut self, symbol: &NonTerminal, range: &Range<usize>) {
    self.line(format!("(cycle back to {} [{}, {}))", symbol, range.start, range.end));
  }
}

fn main() -> anyhow::Result<()> {
  let tokens = "1 + 2 * 3"
    .split_whitespace()
    .map(|lexeme| {
      let kind = if lexeme == "+" || lexeme == "*" {
        lexeme
      } else {
        "integer"
      };
      Token::new(Terminal::new(kind), lexeme)
    })
    .collect::<Vec<_>>();

  let parser = ForestParser::new(examples::make_ambiguous_expression());
  let forest = parser.parse(tokens)?;

  forest.accept(&mut Outline::default());
  println!();
  println!("{}", forest.to_dot());
  Ok(())
}
