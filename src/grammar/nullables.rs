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

use {
  super::{Elem, NonTerminal},
  crate::utils::{change_iter, change_loop, WasChanged},
  std::collections::BTreeSet,
};

/// Calculate the nullable set of a grammar
///
/// The nullable set of a grammar is the set of non-terminals in that grammar
/// that can parse the empty terminal sequence. Productions are given as
/// `(head, elements)` pairs.
pub(super) fn calculate_nullables<'a, I>(prods: I) -> BTreeSet<NonTerminal>
where
  I: Iterator<Item = (&'a NonTerminal, &'a [Elem])> + Clone,
{
  let mut nullables = BTreeSet::new();

  change_loop(|| {
    change_iter(prods.clone(), |(head, elements)| {
      if nullables.contains(head) || !is_prod_nullable(&nullables, elements) {
        return WasChanged::Unchanged;
      }

      WasChanged::from_changed(nullables.insert(head.clone()))
    })
  });

  nullables
}

fn is_prod_nullable(nullables: &BTreeSet<NonTerminal>, elements: &[Elem]) -> bool {
  elements.iter().all(|elem| match elem {
    Elem::Term(_) => false,
    Elem::NonTerm(nt) => nullables.contains(nt),
  })
}

#[cfg(test)]
mod test {
  use crate::grammar::{examples, NonTerminal};

  #[test]
  fn test_simple_grammar() {
    let g = examples::make_abc();
    assert!(g.nullable_set().is_empty());
  }

  #[test]
  fn test_direct_nullable() {
    let g = examples::make_nullable_pair();
    assert!(g.is_nullable(&NonTerminal::new("A")));
    assert!(!g.is_nullable(&NonTerminal::new("Ss")));
  }

  #[test]
  fn test_transitive_nullable() {
    let g = examples::make_transitive_nullable();
    assert!(g.is_nullable(&NonTerminal::new("S")));
    assert!(g.is_nullable(&NonTerminal::new("A")));
    assert!(g.is_nullable(&NonTerminal::new("B")));
    assert!(!g.is_nullable(&NonTerminal::new("C")));
  }
}
