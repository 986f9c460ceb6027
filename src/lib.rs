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

//! A general context-free parser built on a Grammar Flow Graph (GFG).
//!
//! A grammar is compiled once into a [`gfg::Gfg`]: a graph with a start and
//! an end vertex per nonterminal and one vertex per dotted item. Parsing a
//! token sequence fills an Earley chart by walking that graph, recording for
//! every chart entry the entries that justified it. A backward walk over
//! those antecedents then yields either a single parse tree or a shared
//! packed parse forest covering every derivation of an ambiguous input.
//!
//! ```rust
//! # use gfg_earley::grammar::{build, NonTerminal, Terminal};
//! # use gfg_earley::gfg::Gfg;
//! # use gfg_earley::parsers::{Recognizer, Token};
//! let s = NonTerminal::new("S");
//! let a = Terminal::new("a");
//! let g = build(&s, |gb| {
//!   gb.add_rule(&s, |rb| {
//!     rb.add_prod(|pb| {
//!       pb.add_term(&a).add_nonterm(&s);
//!     })
//!     .add_prod(|_pb| {});
//!   });
//! })
//! .unwrap();
//!
//! let gfg = Gfg::new(g);
//! let parsing = Recognizer::new(&gfg)
//!   .parse(vec![Token::new(a.clone(), "a"), Token::new(a.clone(), "a")])
//!   .unwrap();
//! let tree = parsing.build_tree().unwrap();
//! assert_eq!(tree.root().symbol().unwrap(), &s);
//! ```

#[macro_use]
extern crate derivative;

pub mod gfg;
pub mod grammar;
pub mod parsers;
pub mod utils;
