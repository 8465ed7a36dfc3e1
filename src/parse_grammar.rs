//! Line-oriented parsing of weighted CNF grammar files:
//!
//! ```text
//! %start S
//! # comment
//! S -> NP VP [1.0]
//! NP -> "dog" [0.6] | "cat" [0.4]
//! \# -> "#" [1.0]
//! ```
//!
//! A backslash escapes the next char, inside quoted words and in bare
//! nonterminals alike, so every symbol and word has a written form.
use regex::Regex;
use std::str::FromStr;

use crate::grammar::Grammar;
use crate::rules::{Production, Rule};
use crate::Err;

impl FromStr for Grammar {
  type Err = Err;

  /// Parses a grammar from a string. Without a `%start` directive the first
  /// rule's head is the start symbol.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (rules, start) = parse_rules(s)?;
    let start = start
      .or_else(|| rules.first().map(|r| r.head.clone()))
      .unwrap_or_default();
    Ok(Self::new(rules, start)?)
  }
}

pub(crate) type Infallible<'a, T> = (T, &'a str);
pub(crate) type ParseResult<'a, T> = Result<(T, &'a str), Err>;

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}
pub(crate) use regex_static;

/// Try to consume a regex, returning None if it doesn't match
pub(crate) fn optional_re<'a>(re: &'static Regex, s: &'a str) -> Infallible<'a, Option<&'a str>> {
  match re.find(s) {
    Some(m) if m.start() == 0 => (Some(m.as_str()), &s[m.end()..]),
    _ => (None, s),
  }
}

/// Try to consume a regex, failing if it doesn't match
pub(crate) fn needed_re<'a>(re: &'static Regex, s: &'a str) -> ParseResult<'a, &'a str> {
  if let (Some(c), rest) = optional_re(re, s) {
    Ok((c, rest))
  } else {
    Err(format!("couldn't match {} at {}", re, s).into())
  }
}

/// Try to consume a char, returning None if it doesn't match
pub(crate) fn optional_char(c: char, s: &str) -> Infallible<'_, Option<char>> {
  match s.strip_prefix(c) {
    Some(rest) => (Some(c), rest),
    None => (None, s),
  }
}

/// Try to consume a char, failing if it doesn't match
pub(crate) fn needed_char(c: char, s: &str) -> ParseResult<'_, char> {
  if let (Some(c), rest) = optional_char(c, s) {
    Ok((c, rest))
  } else {
    Err(format!("couldn't match {} at {}", c, s).into())
  }
}

pub(crate) fn skip_whitespace(s: &str) -> &str {
  s.trim_start()
}

/// Drops each escaping backslash, keeping the char after it
fn unescape(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut chars = s.chars();
  while let Some(c) = chars.next() {
    match c {
      '\\' => out.extend(chars.next()),
      c => out.push(c),
    }
  }
  out
}

/// Nonterminals are anything up to whitespace, a quote, a bracket or a bar
fn parse_nonterminal(s: &str) -> ParseResult<'_, String> {
  regex_static!(NONTERMINAL, r#"(?:[^\s"'\[\]|\\]|\\.)+"#);
  let (name, s) =
    needed_re(&NONTERMINAL, s).map_err(|e| -> Err { format!("nonterminal: {}", e).into() })?;
  Ok((unescape(name), s))
}

fn parse_terminal(s: &str) -> ParseResult<'_, String> {
  regex_static!(QUOTED, r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'"#);
  let (quoted, s) = needed_re(&QUOTED, s).map_err(|e| -> Err { format!("terminal: {}", e).into() })?;
  let word = unescape(&quoted[1..quoted.len() - 1]);
  if word.is_empty() {
    Err("terminal: empty string is not a word".into())
  } else {
    Ok((word, s))
  }
}

/// Parses a bracketed probability: [0.25]
fn parse_prob(s: &str) -> ParseResult<'_, f64> {
  regex_static!(NUMBER, r"\+?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][-+]?[0-9]+)?");
  let (_, s) = needed_char('[', s)?;
  let s = skip_whitespace(s);
  let (num, s) = needed_re(&NUMBER, s).map_err(|e| -> Err { format!("probability: {}", e).into() })?;
  let s = skip_whitespace(s);
  let (_, s) = needed_char(']', s)?;
  let prob = num
    .parse::<f64>()
    .map_err(|e| -> Err { format!("probability {}: {}", num, e).into() })?;
  Ok((prob, s))
}

/// One `|`-separated alternative: productions with an optional trailing [prob]
fn parse_alternative(s: &str) -> ParseResult<'_, (Vec<Production>, f64)> {
  let mut productions = Vec::new();
  let mut prob = None;
  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    if rem.is_empty() || rem.starts_with('|') {
      break;
    }
    if prob.is_some() {
      return Err(format!("unexpected input after probability: {}", rem).into());
    }
    if rem.starts_with('[') {
      let (p, s) = parse_prob(rem)?;
      prob = Some(p);
      rem = s;
    } else if rem.starts_with('"') || rem.starts_with('\'') {
      let (word, s) = parse_terminal(rem)?;
      productions.push(Production::Terminal(word));
      rem = s;
    } else {
      let (name, s) = parse_nonterminal(rem)?;
      productions.push(Production::Nonterminal(name));
      rem = s;
    }
  }

  if productions.is_empty() {
    Err("empty alternative".into())
  } else {
    Ok(((productions, prob.unwrap_or(1.0)), rem))
  }
}

/// `LHS -> alt | alt ...`, one rule per alternative
fn parse_rule_line(s: &str) -> Result<Vec<Rule>, Err> {
  let (lhs, rhs) = s
    .split_once("->")
    .ok_or_else(|| -> Err { "rule arrow: missing ->".into() })?;

  let lhs = lhs.trim_start();
  let (head, rest) = parse_nonterminal(lhs).map_err(|e| -> Err { format!("rule head: {}", e).into() })?;
  if !rest.trim().is_empty() {
    return Err(format!("rule head: expected one symbol, got {}", lhs).into());
  }

  let mut rules = Vec::new();
  let mut rem = rhs;
  loop {
    let ((productions, prob), s) = parse_alternative(rem)?;
    rules.push(Rule::new(head.clone(), productions, prob));
    match optional_char('|', s) {
      (Some(_), s) => rem = s,
      (None, _) => return Ok(rules),
    }
  }
}

fn parse_start(s: &str) -> Result<String, Err> {
  let (start, rest) =
    parse_nonterminal(skip_whitespace(s)).map_err(|e| -> Err { format!("%start: {}", e).into() })?;
  if rest.trim().is_empty() {
    Ok(start)
  } else {
    Err(format!("%start takes exactly one symbol: {}", s).into())
  }
}

/// Parses every rule in `s`, along with the `%start` symbol if one is declared
pub fn parse_rules(s: &str) -> Result<(Vec<Rule>, Option<String>), Err> {
  let mut rules = Vec::new();
  let mut start = None;

  for (idx, line) in s.lines().enumerate() {
    let line = line.trim();
    // an escaped `\#` starts a rule
    if line.is_empty() || line.starts_with('#') {
      continue;
    }

    let parsed = if let Some(directive) = line.strip_prefix("%start") {
      parse_start(directive).map(|s| start = Some(s))
    } else {
      parse_rule_line(line).map(|mut r| rules.append(&mut r))
    };
    parsed.map_err(|e| -> Err { format!("line {}: {}", idx + 1, e).into() })?;
  }

  Ok((rules, start))
}
