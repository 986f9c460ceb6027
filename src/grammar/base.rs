// Copyright 2018 Google LLC
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

pub mod builder;

use {
  super::nullables::calculate_nullables,
  crate::{
    parsers::Token,
    utils::{breadth_first_search, to_pretty_string, Name, ToDoc},
  },
  std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
  },
};

/// A terminal symbol, identified by name.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Terminal(Name);

impl Terminal {
  pub fn new(s: &str) -> Self {
    Terminal(Name::new(s))
  }

  pub fn name(&self) -> &Name {
    &self.0
  }
}

impl std::fmt::Display for Terminal {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    std::fmt::Display::fmt(&self.0, f)
  }
}

impl ToDoc for Terminal {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA> {
    da.text(self.0.str().to_string())
  }
}

/// A nonterminal symbol, identified by name.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NonTerminal(Name);

impl NonTerminal {
  pub fn new(s: &str) -> Self {
    NonTerminal(Name::new(s))
  }

  pub fn name(&self) -> &Name {
    &self.0
  }
}

impl std::fmt::Display for NonTerminal {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    std::fmt::Display::fmt(&self.0, f)
  }
}

impl ToDoc for NonTerminal {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA> {
    da.text(self.0.str().to_string())
  }
}

/// A single element (terminal or non-terminal).
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum Elem {
  Term(Terminal),
  NonTerm(NonTerminal),
}

impl Elem {
  /// If this element is a terminal, returns a `Some` value containing a
  /// terminal datum. Returns `None` otherwise.
  pub fn as_term(&self) -> Option<&Terminal> {
    match self {
      Elem::NonTerm(_) => None,
      Elem::Term(t) => Some(t),
    }
  }

  /// Gets an element as a nonterm. Returns a `None` value otherwise.
  pub fn as_nonterm(&self) -> Option<&NonTerminal> {
    match self {
      Elem::NonTerm(nt) => Some(nt),
      Elem::Term(_) => None,
    }
  }
}

impl ToDoc for Elem {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    match self {
      Elem::NonTerm(nt) => {
        da.text("<").append(nt.to_doc(da)).append(da.text(">"))
      }
      Elem::Term(t) => t.to_doc(da),
    }
  }
}

impl std::fmt::Debug for Elem {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self {
      Elem::Term(term) => fmt.write_str(&format!("{}", term)),
      Elem::NonTerm(nt) => fmt.write_str(&format!("<{}>", nt)),
    }
  }
}

impl From<Terminal> for Elem {
  fn from(t: Terminal) -> Elem {
    Elem::Term(t)
  }
}

impl From<NonTerminal> for Elem {
  fn from(nt: NonTerminal) -> Elem {
    Elem::NonTerm(nt)
  }
}

/// The information handed to a production [`Constraint`] when a completed
/// nonterminal is about to be returned into a production that called it.
pub struct ReturnContext<'a> {
  /// The production being resumed.
  pub prod: Prod<'a>,
  /// The index within `prod` of the nonterminal that was completed.
  pub elem_index: usize,
  /// The completed nonterminal.
  pub callee: &'a NonTerminal,
  /// Token index where the resumed production started.
  pub call_origin: usize,
  /// Token index where the completed nonterminal started.
  pub callee_origin: usize,
  /// Token index where the completed nonterminal ended.
  pub position: usize,
  /// The complete token sequence being recognized.
  pub tokens: &'a [Token],
}

impl<'a> ReturnContext<'a> {
  /// The tokens matched by the completed nonterminal.
  pub fn callee_tokens(&self) -> &'a [Token] {
    &self.tokens[self.callee_origin..self.position]
  }
}

/// An opaque disambiguation predicate attached to a production.
///
/// The recognizer consults the constraint of a production each time a
/// completed nonterminal would be returned into it. Returning `false` vetoes
/// that return, pruning the corresponding derivation.
#[derive(Clone)]
pub struct Constraint(Arc<dyn Fn(&ReturnContext) -> bool + Send + Sync>);

impl Constraint {
  pub fn new(
    predicate: impl Fn(&ReturnContext) -> bool + Send + Sync + 'static,
  ) -> Self {
    Constraint(Arc::new(predicate))
  }

  pub fn permits(&self, context: &ReturnContext) -> bool {
    (self.0)(context)
  }
}

impl std::fmt::Debug for Constraint {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    f.write_str("Constraint(..)")
  }
}

/// The identity of a production: its position in grammar order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ProdId(usize);

impl ProdId {
  pub fn index(self) -> usize {
    self.0
  }
}

#[derive(Clone, Derivative)]
#[derivative(Debug)]
struct ProdInner {
  head: NonTerminal,
  elements: Vec<Elem>,
  #[derivative(Debug = "ignore")]
  constraint: Option<Constraint>,
}

impl ToDoc for ProdInner {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    if self.elements.is_empty() {
      da.text("ε")
    } else {
      da.intersperse(self.elements.iter().map(|e| e.to_doc(da)), da.softline())
    }
  }
}

#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum GrammarError {
  #[error("start symbol <{0}> has no rule")]
  MissingStartRule(NonTerminal),
  #[error(
    "nonterminal <{nonterm}> is used in a production of <{referenced_by}> but has no rule"
  )]
  UndefinedNonTerminal {
    nonterm: NonTerminal,
    referenced_by: NonTerminal,
  },
}

/// A context-free grammar.
///
/// This is a context-free grammar consisting of
///
/// - A start nonterminal
/// - An ordered list of productions, where each production consists of
///   - A head nonterminal
///   - A (possibly empty) list of elements, each either a terminal or a
///     nonterminal
///   - An optional constraint consulted during recognition
///
/// Grammars are read-only once built, and the accessors use the lifetime of
/// the grammar object. Nullability of every nonterminal is computed when the
/// grammar is built.
#[derive(Clone)]
pub struct Grammar {
  start_symbol: NonTerminal,
  prods: Vec<ProdInner>,
  rule_set: BTreeMap<NonTerminal, Vec<ProdId>>,
  nullables: BTreeSet<NonTerminal>,
}

impl std::fmt::Debug for Grammar {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    let mut dbg_struct = f.debug_struct("Grammar");
    dbg_struct.field("Start", &self.start_symbol);
    dbg_struct.field("Terms", &self.get_terminals());
    dbg_struct.field("Rules", &self.rules().collect::<Vec<Rule>>());
    dbg_struct.finish()
  }
}

impl Grammar {
  fn new(
    start: NonTerminal,
    heads: impl IntoIterator<Item = NonTerminal>,
    prods: Vec<ProdInner>,
  ) -> Result<Self, GrammarError> {
    let mut rule_set: BTreeMap<NonTerminal, Vec<ProdId>> =
      heads.into_iter().map(|head| (head, Vec::new())).collect();
    for (index, prod) in prods.iter().enumerate() {
      rule_set
        .entry(prod.head.clone())
        .or_insert_with(Vec::new)
        .push(ProdId(index));
    }

    let nullables = calculate_nullables(
      prods.iter().map(|prod| (&prod.head, prod.elements.as_slice())),
    );

    let g = Grammar {
      start_symbol: start,
      prods,
      rule_set,
      nullables,
    };

    g.check_grammar().map(|_| g)
  }

  /// Returns the start nonterminal for this grammar.
  pub fn start_nt(&self) -> &NonTerminal {
    &self.start_symbol
  }

  fn get_elements(&self) -> impl Iterator<Item = &Elem> {
    self.prods.iter().flat_map(|p| p.elements.iter())
  }

  /// Returns the set of terminals used anywhere in the grammar.
  pub fn get_terminals(&self) -> BTreeSet<&Terminal> {
    self.get_elements().filter_map(|e| e.as_term()).collect()
  }

  /// Returns the set of nonterminals that head a rule.
  pub fn get_nonterminals(&self) -> impl Iterator<Item = &NonTerminal> {
    self.rule_set.keys()
  }

  /// Returns an iterator over all of the rules for this grammar, ordered by
  /// head nonterminal.
  pub fn rules(&self) -> impl Iterator<Item = Rule> {
    self
      .rule_set
      .iter()
      .map(move |(head, prods)| Rule::new(self, head, prods))
  }

  /// Gets an iterator over all productions in the grammar, in the order they
  /// were added.
  pub fn prods(&self) -> impl Iterator<Item = Prod> {
    (0..self.prods.len()).map(move |index| Prod::new(self, ProdId(index)))
  }

  /// Returns the production with the given id. Panics if the id comes from
  /// another grammar.
  pub fn prod(&self, id: ProdId) -> Prod {
    assert!(id.0 < self.prods.len(), "ProdId {:?} out of range", id);
    Prod::new(self, id)
  }

  /// Gets the rule that has the given nonterminal as a head.
  pub fn try_get_rule<'a>(&'a self, nt: &NonTerminal) -> Option<Rule<'a>> {
    self
      .rule_set
      .get_key_value(nt)
      .map(|(head, prods)| Rule::new(self, head, prods))
  }

  /// Returns true if the nonterminal can derive the empty token sequence.
  pub fn is_nullable(&self, nt: &NonTerminal) -> bool {
    self.nullables.contains(nt)
  }

  /// Returns true if the element can derive the empty token sequence.
  /// Terminals are never nullable.
  pub fn is_elem_nullable(&self, elem: &Elem) -> bool {
    match elem {
      Elem::Term(_) => false,
      Elem::NonTerm(nt) => self.is_nullable(nt),
    }
  }

  /// Returns the set of nullable nonterminals.
  pub fn nullable_set(&self) -> &BTreeSet<NonTerminal> {
    &self.nullables
  }

  fn reachable_nonterms(&self) -> BTreeSet<&NonTerminal> {
    breadth_first_search(std::iter::once(&self.start_symbol), |nt| {
      self
        .rule_set
        .get(*nt)
        .into_iter()
        .flatten()
        .flat_map(|id| self.prods[id.0].elements.iter())
        .filter_map(|e| e.as_nonterm())
        .collect::<BTreeSet<_>>()
    })
  }

  fn check_grammar(&self) -> Result<(), GrammarError> {
    if !self.rule_set.contains_key(&self.start_symbol) {
      return Err(GrammarError::MissingStartRule(self.start_symbol.clone()));
    }

    for prod in &self.prods {
      for nt in prod.elements.iter().filter_map(Elem::as_nonterm) {
        if !self.rule_set.contains_key(nt) {
          return Err(GrammarError::UndefinedNonTerminal {
            nonterm: nt.clone(),
            referenced_by: prod.head.clone(),
          });
        }
      }
    }

    let reachable = self.reachable_nonterms();
    for nt in self.rule_set.keys() {
      if !reachable.contains(nt) {
        log::warn!("Nonterminal <{}> is unreachable from the start symbol.", nt);
      }
    }

    Ok(())
  }

  pub fn to_pretty(&self) -> String {
    to_pretty_string(self, 80)
  }
}

impl ToDoc for Grammar {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    let start_entry = da
      .text("Start =")
      .group()
      .append(da.softline())
      .append(self.start_nt().to_doc(da));
    let rules_entry = da.text("Rules ").append(
      da.softline()
        .append(
          da.concat(self.rules().map(|rule| {
            rule.to_doc(da).append(da.text(";")).append(da.softline())
          }))
          .nest(2),
        )
        .braces(),
    );

    da.concat(
      vec![start_entry, rules_entry]
        .into_iter()
        .map(|doc| doc.append(da.text(",")).append(da.softline())),
    )
  }
}

// ------------

/// A rule within a grammar.
///
/// A rule consists of a head nonterminal, and zero or more different possible
/// productions.
#[derive(Copy, Clone)]
pub struct Rule<'a> {
  grammar: &'a Grammar,
  head: &'a NonTerminal,
  prods: &'a [ProdId],
}

impl<'a> Rule<'a> {
  fn new(
    grammar: &'a Grammar,
    head: &'a NonTerminal,
    prods: &'a [ProdId],
  ) -> Self {
    Rule {
      grammar,
      head,
      prods,
    }
  }

  /// Returns the head nonterminal.
  pub fn head(&self) -> &'a NonTerminal {
    self.head
  }

  /// Returns an iterator over the productions of this rule.
  pub fn prods(&self) -> impl Iterator<Item = Prod<'a>> {
    let grammar = self.grammar;
    self.prods.iter().map(move |id| Prod::new(grammar, *id))
  }
}

impl ToDoc for Rule<'_> {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    self
      .head
      .to_doc(da)
      .append(da.text(" =>"))
      .append(da.softline())
      .append(da.intersperse(
        self.prods.iter().map(|id| self.grammar.prods[id.0].to_doc(da)),
        da.text(" |").append(da.softline()),
      ))
  }
}

impl std::fmt::Debug for Rule<'_> {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    let mut dbg_struct = fmt.debug_struct("Rule");
    dbg_struct.field("head", self.head());
    dbg_struct.field("prods", &self.prods().collect::<Vec<_>>());
    dbg_struct.finish()
  }
}

// ------------

/// A single production in a grammar.
///
/// A production has a head, which is a nonterminal which it's reduced to, and
/// a sequence of elements indicating the body of the production.
#[derive(Copy, Clone)]
pub struct Prod<'a> {
  grammar: &'a Grammar,
  id: ProdId,
}

impl<'a> Prod<'a> {
  fn new(grammar: &'a Grammar, id: ProdId) -> Self {
    Prod { grammar, id }
  }

  fn inner(&self) -> &'a ProdInner {
    &self.grammar.prods[self.id.0]
  }

  pub fn id(&self) -> ProdId {
    self.id
  }

  /// Returns the head of this production.
  pub fn head(&self) -> &'a NonTerminal {
    &self.inner().head
  }

  /// Returns the elements of this production.
  pub fn elements(&self) -> &'a [Elem] {
    &self.inner().elements
  }

  /// Returns the number of elements in this production.
  pub fn num_elements(&self) -> usize {
    self.inner().elements.len()
  }

  /// Returns true if the production has no elements.
  pub fn is_empty(&self) -> bool {
    self.inner().elements.is_empty()
  }

  /// Returns the element at a given index, or `None` past the end.
  pub fn element_at(&self, index: usize) -> Option<&'a Elem> {
    self.inner().elements.get(index)
  }

  /// Returns the constraint attached to this production, if any.
  pub fn constraint(&self) -> Option<&'a Constraint> {
    self.inner().constraint.as_ref()
  }
}

impl PartialEq for Prod<'_> {
  fn eq(&self, other: &Self) -> bool {
    std::ptr::eq(self.grammar, other.grammar) && self.id == other.id
  }
}

impl Eq for Prod<'_> {}

impl ToDoc for Prod<'_> {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    self
      .head()
      .to_doc(da)
      .append(da.text(" =>"))
      .append(da.softline())
      .append(self.inner().to_doc(da))
  }
}

impl std::fmt::Debug for Prod<'_> {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    let mut dbg_struct = fmt.debug_struct("Prod");
    dbg_struct.field("head", self.head());
    dbg_struct.field("elems", &self.elements());
    dbg_struct.finish()
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::grammar::{build, examples};

  #[test]
  fn test_prods_keep_insertion_order() {
    let g = examples::make_expression();
    let heads = g
      .prods()
      .map(|p| p.head().name().str().to_string())
      .collect::<Vec<_>>();
    assert_eq!(heads, vec!["P", "S", "S", "M", "M", "T", "T"]);
  }

  #[test]
  fn test_rule_lookup() {
    let g = examples::make_expression();
    let rule = g.try_get_rule(&NonTerminal::new("M")).unwrap();
    assert_eq!(rule.prods().count(), 2);
    assert!(g.try_get_rule(&NonTerminal::new("Q")).is_none());
  }

  #[test]
  fn test_undefined_nonterminal() {
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
  fn test_missing_start_rule() {
    let s = NonTerminal::new("S");
    let a = NonTerminal::new("A");
    let t = Terminal::new("t");
    let err = build(&s, |gb| {
      gb.add_rule(&a, |rb| {
        rb.add_prod(|pb| {
          pb.add_term(&t);
        });
      });
    })
    .unwrap_err();

    assert_eq!(err, GrammarError::MissingStartRule(s));
  }

  #[test]
  fn test_pretty_print() {
    let g = examples::make_abc();
    let text = g.to_pretty().split_whitespace().collect::<Vec<_>>().join(" ");
    assert!(text.contains("A => a <A> c | b;"), "got: {}", text);
    assert!(text.contains("Start = S,"), "got: {}", text);
  }

  #[test]
  fn test_prod_equality_is_per_grammar() {
    let first = examples::make_abc();
    let second = examples::make_abc();
    let a = first.prods().next().unwrap();
    assert!(a == first.prods().next().unwrap());
    assert!(a != first.prods().nth(1).unwrap());
    assert!(a != second.prods().next().unwrap());
  }

  #[test]
  fn test_terminals() {
    let g = examples::make_abc();
    let terms = g
      .get_terminals()
      .into_iter()
      .map(|t| t.name().str().to_string())
      .collect::<Vec<_>>();
    assert_eq!(terms, vec!["a", "b", "c"]);
  }
}
