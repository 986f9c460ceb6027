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

//! Parses an arithmetic expression given on the command line, e.g.
//! `cargo run --example simple_tree -- "( 1 + 2 ) * 3"`.

use gfg_earley::{
  grammar::{examples, Terminal},
  parsers::{Parser, Token, TreeParser},
};

fn lex(text: &str) -> Vec<Token> {
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

fn main() -> anyhow::Result<()> {
  let input = std::env::args()
    .nth(1)
    .unwrap_or_else(|| "2 + 3 * 4".to_string());

  let parser = TreeParser::new(examples::make_expression());
  println!("{}", parser.gfg().grammar().to_pretty());

  let tree = parser.parse(lex(&input))?;
  println!("{}", tree.to_pretty());
  Ok(())
}
