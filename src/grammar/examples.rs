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

//! Small grammars used throughout the tests and demos.

use crate::grammar::{build, Constraint, Elem, Grammar, NonTerminal, Terminal};

/// `S => A; A => a A c | b`
pub fn make_abc() -> Grammar {
  let s = NonTerminal::new("S");
  let a_nt = NonTerminal::new("A");
  let a = Terminal::new("a");
  let b = Terminal::new("b");
  let c = Terminal::new("c");

  build(&s, |gb| {
    gb.add_rule(&s, |rb| {
      rb.add_prod(|pb| {
        pb.add_nonterm(&a_nt);
      });
    })
    .add_rule(&a_nt, |rb| {
      rb.add_prod(|pb| {
        pb.add_term(&a).add_nonterm(&a_nt).add_term(&c);
      })
      .add_prod(|pb| {
        pb.add_term(&b);
      });
    });
  })
  .unwrap()
}

/// `Ss => A A x; A => ε`
pub fn make_nullable_pair() -> Grammar {
  let ss = NonTerminal::new("Ss");
  let a_nt = NonTerminal::new("A");
  let x = Terminal::new("x");

  build(&ss, |gb| {
    gb.add_rule(&ss, |rb| {
      rb.add_prod(|pb| {
        pb.add_nonterm(&a_nt).add_nonterm(&a_nt).add_term(&x);
      });
    })
    .add_rule(&a_nt, |rb| {
      rb.add_prod(|_pb| {});
    });
  })
  .unwrap()
}

/// `S => A B; A => B; B => ε | C; C => c`
pub fn make_transitive_nullable() -> Grammar {
  let s = NonTerminal::new("S");
  let a_nt = NonTerminal::new("A");
  let b_nt = NonTerminal::new("B");
  let c_nt = NonTerminal::new("C");
  let c = Terminal::new("c");

  build(&s, |gb| {
    gb.add_rule(&s, |rb| {
      rb.add_prod(|pb| {
        pb.add_nonterm(&a_nt).add_nonterm(&b_nt);
      });
    })
    .add_rule(&a_nt, |rb| {
      rb.add_prod(|pb| {
        pb.add_nonterm(&b_nt);
      });
    })
    .add_rule(&b_nt, |rb| {
      rb.add_prod(|_pb| {}).add_prod(|pb| {
        pb.add_nonterm(&c_nt);
      });
    })
    .add_rule(&c_nt, |rb| {
      rb.add_prod(|pb| {
        pb.add_term(&c);
      });
    });
  })
  .unwrap()
}

/// The usual arithmetic grammar, where `*` binds tighter than `+`:
///
/// ```text
/// P => S
/// S => S + M | M
/// M => M * T | T
/// T => integer | ( S )
/// ```
pub fn make_expression() -> Grammar {
  let p = NonTerminal::new("P");
  let s = NonTerminal::new("S");
  let m = NonTerminal::new("M");
  let t = NonTerminal::new("T");
  let plus = Terminal::new("+");
  let star = Terminal::new("*");
  let integer = Terminal::new("integer");
  let lparen = Terminal::new("(");
  let rparen = Terminal::new(")");

  build(&p, |gb| {
    gb.add_rule(&p, |rb| {
      rb.add_prod(|pb| {
        pb.add_nonterm(&s);
      });
    })
    .add_rule(&s, |rb| {
      rb.add_prod(|pb| {
        pb.add_nonterm(&s).add_term(&plus).add_nonterm(&m);
      })
      .add_prod(|pb| {
        pb.add_nonterm(&m);
      });
    })
    .add_rule(&m, |rb| {
      rb.add_prod(|pb| {
        pb.add_nonterm(&m).add_term(&star).add_nonterm(&t);
      })
      .add_prod(|pb| {
        pb.add_nonterm(&t);
      });
    })
    .add_rule(&t, |rb| {
      rb.add_prod(|pb| {
        pb.add_term(&integer);
      })
      .add_prod(|pb| {
        pb.add_term(&lparen).add_nonterm(&s).add_term(&rparen);
      });
    });
  })
  .unwrap()
}

/// An ambiguous arithmetic grammar without precedence:
///
/// ```text
/// S => S + S | S * S | L
/// L => integer
/// ```
pub fn make_ambiguous_expression() -> Grammar {
  let s = NonTerminal::new("S");
  let l = NonTerminal::new("L");
  let plus = Terminal::new("+");
  let star = Terminal::new("*");
  let integer = Terminal::new("integer");

  build(&s, |gb| {
    gb.add_rule(&s, |rb| {
      rb.add_prod(|pb| {
        pb.add_nonterm(&s).add_term(&plus).add_nonterm(&s);
      })
      .add_prod(|pb| {
        pb.add_nonterm(&s).add_term(&star).add_nonterm(&s);
      })
      .add_prod(|pb| {
        pb.add_nonterm(&l);
      });
    })
    .add_rule(&l, |rb| {
      rb.add_prod(|pb| {
        pb.add_term(&integer);
      });
    });
  })
  .unwrap()
}

/// `S => A A; A => a | a a`, ambiguous in where the two `A`s split.
pub fn make_split_ambiguity() -> Grammar {
  let s = NonTerminal::new("S");
  let a_nt = NonTerminal::new("A");
  let a = Terminal::new("a");

  build(&s, |gb| {
    gb.add_rule(&s, |rb| {
      rb.add_prod_with_elems(vec![
        Elem::NonTerm(a_nt.clone()),
        Elem::NonTerm(a_nt.clone()),
      ]);
    })
    .add_rule(&a_nt, |rb| {
      rb.add_prod(|pb| {
        pb.add_term(&a);
      })
      .add_prod(|pb| {
        pb.add_term(&a).add_term(&a);
      });
    });
  })
  .unwrap()
}

/// `S => S a | a`
pub fn make_left_recursive() -> Grammar {
  let s = NonTerminal::new("S");
  let a = Terminal::new("a");

  build(&s, |gb| {
    gb.add_rule(&s, |rb| {
      rb.add_prod(|pb| {
        pb.add_nonterm(&s).add_term(&a);
      })
      .add_prod(|pb| {
        pb.add_term(&a);
      });
    });
  })
  .unwrap()
}

/// `S => S S | a`, where a run of `n` tokens has Catalan(n - 1)
/// derivations.
pub fn make_binary_concat() -> Grammar {
  let s = NonTerminal::new("S");
  let a = Terminal::new("a");

  build(&s, |gb| {
    gb.add_rule(&s, |rb| {
      rb.add_prod(|pb| {
        pb.add_nonterm(&s).add_nonterm(&s);
      })
      .add_prod(|pb| {
        pb.add_term(&a);
      });
    });
  })
  .unwrap()
}

/// `A => A | a`, which has infinitely many derivations of `a`.
pub fn make_cyclic() -> Grammar {
  let a_nt = NonTerminal::new("A");
  let a = Terminal::new("a");

  build(&a_nt, |gb| {
    gb.add_rule(&a_nt, |rb| {
      rb.add_prod(|pb| {
        pb.add_nonterm(&a_nt);
      })
      .add_prod(|pb| {
        pb.add_term(&a);
      });
    });
  })
  .unwrap()
}

/// The dangling-else grammar:
///
/// ```text
/// S => if E then S | if E then S else S | other
/// E => cond
/// ```
///
/// With `closest_else` set, the `if-then-else` production refuses a `then`
/// branch that itself contains an `if`, so every `else` binds to the nearest
/// `then`.
pub fn make_dangling_else(closest_else: bool) -> Grammar {
  let s = NonTerminal::new("S");
  let e = NonTerminal::new("E");
  let if_t = Terminal::new("if");
  let then_t = Terminal::new("then");
  let else_t = Terminal::new("else");
  let other = Terminal::new("other");
  let cond = Terminal::new("cond");

  let if_check = if_t.clone();
  let closest = Constraint::new(move |ctx| {
    ctx.elem_index != 3
      || !ctx.callee_tokens().iter().any(|tok| tok.kind() == &if_check)
  });

  build(&s, |gb| {
    gb.add_rule(&s, |rb| {
      rb.add_prod(|pb| {
        pb.add_term(&if_t)
          .add_nonterm(&e)
          .add_term(&then_t)
          .add_nonterm(&s);
      });

      let if_else = |pb: &mut crate::grammar::ProductionBuilder| {
        pb.add_term(&if_t)
          .add_nonterm(&e)
          .add_term(&then_t)
          .add_nonterm(&s)
          .add_term(&else_t)
          .add_nonterm(&s);
      };
      if closest_else {
        rb.add_constrained_prod(closest, if_else);
      } else {
        rb.add_prod(if_else);
      }

      rb.add_prod(|pb| {
        pb.add_term(&other);
      });
    })
    .add_rule(&e, |rb| {
      rb.add_prod(|pb| {
        pb.add_term(&cond);
      });
    });
  })
  .unwrap()
}
