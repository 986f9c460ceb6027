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
  crate::{grammar::Terminal, parsers::Token},
  std::collections::BTreeSet,
};

fn describe_expected(expected: &BTreeSet<Terminal>) -> String {
  if expected.is_empty() {
    return "end of input".to_string();
  }
  let names = expected
    .iter()
    .map(|t| format!("'{}'", t))
    .collect::<Vec<_>>();
  format!("one of [{}]", names.join(", "))
}

/// Why a token sequence was not recognized.
///
/// Positions are 0-based token indices; messages print them 1-based.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
  #[error("no input: the grammar does not accept an empty token sequence")]
  NoInput,
  #[error(
    "syntax error at or near token {} >>>{}<<<: expected {}, found a '{}' instead",
    .position + 1,
    .last_token.lexeme(),
    describe_expected(.expected),
    .last_token.kind()
  )]
  UnexpectedToken {
    position: usize,
    last_token: Token,
    expected: BTreeSet<Terminal>,
  },
  #[error(
    "premature end of input after '{}' at position {}: expected {}",
    .last_token.lexeme(),
    .position + 1,
    describe_expected(.expected)
  )]
  PrematureInputEnd {
    position: usize,
    last_token: Token,
    expected: BTreeSet<Terminal>,
  },
}

impl ParseError {
  /// The index of the offending (or last) token.
  pub fn position(&self) -> Option<usize> {
    match self {
      ParseError::NoInput => None,
      ParseError::UnexpectedToken { position, .. }
      | ParseError::PrematureInputEnd { position, .. } => Some(*position),
    }
  }

  /// The terminals that would have been accepted at the failure point.
  pub fn expected(&self) -> Option<&BTreeSet<Terminal>> {
    match self {
      ParseError::NoInput => None,
      ParseError::UnexpectedToken { expected, .. }
      | ParseError::PrematureInputEnd { expected, .. } => Some(expected),
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn terms(names: &[&str]) -> BTreeSet<Terminal> {
    names.iter().map(|name| Terminal::new(name)).collect()
  }

  #[test]
  fn test_unexpected_token_message() {
    let err = ParseError::UnexpectedToken {
      position: 2,
      last_token: Token::new(Terminal::new("plus"), "+"),
      expected: terms(&["integer", "("]),
    };
    assert_eq!(
      err.to_string(),
      concat!(
        "syntax error at or near token 3 >>>+<<<: ",
        "expected one of ['(', 'integer'], found a 'plus' instead"
      )
    );
    assert_eq!(err.position(), Some(2));
  }

  #[test]
  fn test_premature_end_message() {
    let err = ParseError::PrematureInputEnd {
      position: 1,
      last_token: Token::new(Terminal::new("plus"), "+"),
      expected: terms(&["integer"]),
    };
    assert_eq!(
      err.to_string(),
      "premature end of input after '+' at position 2: expected one of ['integer']"
    );
    assert_eq!(err.expected(), Some(&terms(&["integer"])));
  }

  #[test]
  fn test_no_input() {
    assert_eq!(ParseError::NoInput.position(), None);
    assert!(ParseError::NoInput.to_string().starts_with("no input"));
  }
}
