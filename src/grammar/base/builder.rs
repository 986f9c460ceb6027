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

use super::{Constraint, Elem, Grammar, GrammarError, NonTerminal, ProdInner, Terminal};

/// A helper trait to allow builder methods to either take a type `T`, or a
/// reference to `T` if it is clonable.
pub trait BuilderInto<T> {
  /// Consumes self and produces a value of type `T`.
  fn builder_into(self) -> T;
}

impl<T> BuilderInto<T> for T {
  fn builder_into(self) -> T {
    self
  }
}

impl<'a, T> BuilderInto<T> for &'a T
where
  T: Clone,
{
  fn builder_into(self) -> T {
    self.clone()
  }
}

pub struct ProductionBuilder {
  elems: Vec<Elem>,
}

impl ProductionBuilder {
  fn new() -> Self {
    ProductionBuilder { elems: Vec::new() }
  }

  pub fn add_term(&mut self, term: impl BuilderInto<Terminal>) -> &mut Self {
    self.elems.push(Elem::Term(term.builder_into()));
    self
  }

  pub fn add_nonterm(
    &mut self,
    nonterm: impl BuilderInto<NonTerminal>,
  ) -> &mut Self {
    self.elems.push(Elem::NonTerm(nonterm.builder_into()));
    self
  }

  pub fn add_elem(&mut self, elem: impl BuilderInto<Elem>) -> &mut Self {
    self.elems.push(elem.builder_into());
    self
  }
}

// ----------------

pub struct RuleBuilder<'a> {
  head: NonTerminal,
  prods: &'a mut Vec<ProdInner>,
}

impl<'a> RuleBuilder<'a> {
  fn push_prod(
    &mut self,
    constraint: Option<Constraint>,
    build_fn: impl FnOnce(&mut ProductionBuilder),
  ) -> &mut Self {
    let mut builder = ProductionBuilder::new();
    build_fn(&mut builder);
    self.prods.push(ProdInner {
      head: self.head.clone(),
      elements: builder.elems,
      constraint,
    });
    self
  }

  /// Adds a production to this rule. A production with no elements derives
  /// the empty sequence.
  pub fn add_prod(
    &mut self,
    build_fn: impl FnOnce(&mut ProductionBuilder),
  ) -> &mut Self {
    self.push_prod(None, build_fn)
  }

  /// Adds a production whose returns are filtered by `constraint`.
  pub fn add_constrained_prod(
    &mut self,
    constraint: Constraint,
    build_fn: impl FnOnce(&mut ProductionBuilder),
  ) -> &mut Self {
    self.push_prod(Some(constraint), build_fn)
  }

  pub fn add_prod_with_elems(
    &mut self,
    elems: impl BuilderInto<Vec<Elem>>,
  ) -> &mut Self {
    self.push_prod(None, |pb| {
      pb.elems = elems.builder_into();
    })
  }
}

// ----------------

pub struct GrammarBuilder {
  start: NonTerminal,
  heads: Vec<NonTerminal>,
  prods: Vec<ProdInner>,
}

impl GrammarBuilder {
  fn new(start: NonTerminal) -> Self {
    GrammarBuilder {
      start,
      heads: Vec::new(),
      prods: Vec::new(),
    }
  }

  fn build(self) -> Result<Grammar, GrammarError> {
    let GrammarBuilder {
      start,
      heads,
      prods,
    } = self;
    Grammar::new(start, heads, prods)
  }

  /// Adds productions for `head`. Calling this more than once for the same
  /// head appends to the existing rule.
  pub fn add_rule<F>(
    &mut self,
    head: impl BuilderInto<NonTerminal>,
    build_fn: F,
  ) -> &mut Self
  where
    F: FnOnce(&mut RuleBuilder),
  {
    let head = head.builder_into();
    self.heads.push(head.clone());
    let mut rule_builder = RuleBuilder {
      head,
      prods: &mut self.prods,
    };
    build_fn(&mut rule_builder);
    self
  }
}

/// Builds a grammar using a builder function.
///
/// Example:
///
/// ```rust
/// # use gfg_earley::grammar::{Terminal, NonTerminal, Grammar};
/// let t_a = Terminal::new("A");
/// let nt_x = NonTerminal::new("x");
/// let g: Grammar = gfg_earley::grammar::build(&nt_x, |gb| {
///   gb.add_rule(&nt_x, |rb| {
///     rb.add_prod(|pb| {
///       pb.add_term(&t_a).add_nonterm(&nt_x).add_term(&t_a);
///     })
///     .add_prod(|_pb| {});
///   });
/// })
/// .unwrap();
/// assert!(g.is_nullable(&nt_x));
/// ```
///
/// Note that arguments that take a `Terminal`, `NonTerminal` or `Elem` can
/// either take a non-reference value, or a cloneable reference value.
pub fn build(
  start: impl BuilderInto<NonTerminal>,
  build_fn: impl FnOnce(&mut GrammarBuilder),
) -> Result<Grammar, GrammarError> {
  let mut builder = GrammarBuilder::new(start.builder_into());
  build_fn(&mut builder);
  builder.build()
}
