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
    grammar::{NonTerminal, ProdId},
    parsers::Token,
  },
  std::ops::Range,
};

/// Callbacks for a depth-first walk over a `ParseTree` or `Forest`.
///
/// Every method defaults to doing nothing, so implementors only override what
/// they need.
pub trait ParseVisitor {
  fn enter_nonterminal(&mut self, _symbol: &NonTerminal, _range: &Range<usize>) {}

  fn exit_nonterminal(&mut self, _symbol: &NonTerminal, _range: &Range<usize>) {}

  /// Only forests have alternatives.
  fn enter_alternative(
    &mut self,
    _symbol: &NonTerminal,
    _prod: ProdId,
    _range: &Range<usize>,
  ) {
  }

  fn exit_alternative(
    &mut self,
    _symbol: &NonTerminal,
    _prod: ProdId,
    _range: &Range<usize>,
  ) {
  }

  fn visit_token(&mut self, _index: usize, _token: &Token) {}

  fn visit_epsilon(&mut self, _position: usize) {}

  /// A forest node reached again below itself. The walk does not descend.
  fn cycle(&mut self, _symbol: &NonTerminal, _range: &Range<usize>) {}
}
