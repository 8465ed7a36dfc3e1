use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::rules::{escape_symbol, Production, Rule};
use crate::Err;

/// Why a rule set was refused as a CNF grammar
#[derive(Debug, Clone, PartialEq)]
pub enum GrammarError {
  /// Rule isn't `A -> "w"` or `A -> B C`
  NotCnf(String),
  /// Probability outside (0, 1]
  BadProbability(String),
  /// Same head and productions given twice
  DuplicateRule(String),
  NoStartSymbol,
}

impl fmt::Display for GrammarError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::NotCnf(r) => write!(f, "rule is not in chomsky normal form: {}", r),
      Self::BadProbability(r) => write!(f, "rule probability must be in (0, 1]: {}", r),
      Self::DuplicateRule(r) => write!(f, "duplicate rule: {}", r),
      Self::NoStartSymbol => write!(f, "grammar has no start symbol"),
    }
  }
}

impl Error for GrammarError {}

/// A binary rule `head -> left right`, indexed under its left child
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryRule {
  pub head: String,
  pub right: String,
  pub prob: f64,
}

/// An immutable, indexed CNF grammar.
///
/// Lexical rules are looked up by the word they produce and binary rules by
/// their left child, so chart construction only ever touches rules that can
/// apply. Lookups for unknown symbols return empty slices.
#[derive(Debug)]
pub struct Grammar {
  start: String,
  rules: Vec<Rule>,
  by_terminal: HashMap<String, Vec<(String, f64)>>,
  by_left: HashMap<String, Vec<BinaryRule>>,
}

impl Grammar {
  /// Indexes a rule set. Every rule must be CNF, carry a probability in
  /// (0, 1], and appear only once.
  pub fn new(rules: Vec<Rule>, start: impl Into<String>) -> Result<Self, GrammarError> {
    let start = start.into();
    if start.is_empty() || rules.is_empty() {
      return Err(GrammarError::NoStartSymbol);
    }

    let mut seen = HashSet::with_capacity(rules.len());
    let mut by_terminal: HashMap<String, Vec<(String, f64)>> = HashMap::new();
    let mut by_left: HashMap<String, Vec<BinaryRule>> = HashMap::new();
    let mut heads = HashSet::new();

    for rule in rules.iter() {
      if !(rule.prob.is_finite() && rule.prob > 0.0 && rule.prob <= 1.0) {
        return Err(GrammarError::BadProbability(rule.to_string()));
      }
      if !seen.insert(rule.key()) {
        return Err(GrammarError::DuplicateRule(rule.to_string()));
      }

      match rule.productions.as_slice() {
        [Production::Terminal(word)] => {
          by_terminal
            .entry(word.clone())
            .or_default()
            .push((rule.head.clone(), rule.prob));
        }
        [Production::Nonterminal(left), Production::Nonterminal(right)] => {
          by_left.entry(left.clone()).or_default().push(BinaryRule {
            head: rule.head.clone(),
            right: right.clone(),
            prob: rule.prob,
          });
        }
        _ => return Err(GrammarError::NotCnf(rule.to_string())),
      }
      heads.insert(rule.head.as_str());
    }

    if !heads.contains(start.as_str()) {
      warn!(start = %start, "start symbol heads no rule, nothing will parse");
    }
    debug!(
      rules = rules.len(),
      words = by_terminal.len(),
      nonterminals = heads.len(),
      start = %start,
      "indexed grammar"
    );

    Ok(Self {
      start,
      rules,
      by_terminal,
      by_left,
    })
  }

  pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, Err> {
    let path = path.as_ref();
    let src = fs::read_to_string(path)
      .map_err(|e| -> Err { format!("reading {}: {}", path.display(), e).into() })?;
    src.parse()
  }

  /// All `(head, prob)` pairs for rules `head -> word`
  pub fn terminal_rules(&self, word: &str) -> &[(String, f64)] {
    self.by_terminal.get(word).map(Vec::as_slice).unwrap_or(&[])
  }

  /// All binary rules whose left child is `symbol`
  pub fn binary_rules_by_left(&self, symbol: &str) -> &[BinaryRule] {
    self.by_left.get(symbol).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn start(&self) -> &str {
    &self.start
  }

  pub fn rules(&self) -> &[Rule] {
    &self.rules
  }

  pub fn len(&self) -> usize {
    self.rules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }
}

impl fmt::Display for Grammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "%start {}", escape_symbol(&self.start))?;
    for rule in self.rules.iter() {
      writeln!(f, "{}", rule)?;
    }
    Ok(())
  }
}
