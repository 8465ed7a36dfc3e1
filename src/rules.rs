use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Production {
  Terminal(String),
  Nonterminal(String),
}

/// Backslash-escapes every char of `s` that `special` picks out
fn escape(s: &str, special: impl Fn(char) -> bool) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    if special(c) {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

/// A nonterminal as it's written in grammar text. Anything that could be
/// read as a quote, bracket, bar, arrow, comment or directive is escaped.
pub fn escape_symbol(symbol: &str) -> String {
  escape(symbol, |c| c.is_whitespace() || "\\\"'[]|>#%".contains(c))
}

/// A word as it's written between double quotes in grammar text
pub fn escape_word(word: &str) -> String {
  escape(word, |c| c == '"' || c == '\\')
}

impl fmt::Display for Production {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Terminal(s) => write!(f, "\"{}\"", escape_word(s)),
      Self::Nonterminal(s) => write!(f, "{}", escape_symbol(s)),
    }
  }
}

/// A weighted production `head -> productions [prob]`.
///
/// Two rules are the same rule when their head and productions match; the
/// probability does not take part in equality or hashing.
#[derive(Debug, Clone)]
pub struct Rule {
  pub head: String,
  pub productions: Vec<Production>,
  pub prob: f64,
}

impl Rule {
  pub fn new(head: impl Into<String>, productions: Vec<Production>, prob: f64) -> Self {
    Self {
      head: head.into(),
      productions,
      prob,
    }
  }

  /// `head -> "word"`
  pub fn lexical(head: impl Into<String>, word: impl Into<String>, prob: f64) -> Self {
    Self::new(head, vec![Production::Terminal(word.into())], prob)
  }

  /// `head -> left right`
  pub fn binary(
    head: impl Into<String>,
    left: impl Into<String>,
    right: impl Into<String>,
    prob: f64,
  ) -> Self {
    Self::new(
      head,
      vec![
        Production::Nonterminal(left.into()),
        Production::Nonterminal(right.into()),
      ],
      prob,
    )
  }

  pub fn key(&self) -> (&str, &[Production]) {
    (&self.head, &self.productions)
  }
}

impl PartialEq for Rule {
  fn eq(&self, other: &Self) -> bool {
    self.key() == other.key()
  }
}

impl Eq for Rule {}

impl Hash for Rule {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.key().hash(state);
  }
}

impl fmt::Display for Rule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ->", escape_symbol(&self.head))?;
    for p in self.productions.iter() {
      write!(f, " {}", p)?;
    }
    write!(f, " [{}]", self.prob)
  }
}
