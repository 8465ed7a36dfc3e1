//! Reading of bracketed trees, `(S (NP (Det the) (N dog)) (VP barked))`
use regex::Regex;

use crate::parse_grammar::{ParseResult, needed_char, needed_re, optional_char, regex_static, skip_whitespace};
use crate::syntree::{Constituent, SynTree, Word};
use crate::Err;

fn parse_atom(s: &str) -> ParseResult<'_, &str> {
  regex_static!(ATOM, r"[^\s()]+");
  needed_re(&ATOM, s)
}

/// Parses one tree whose first word sits at input position `pos`
fn parse_tree(s: &str, pos: usize) -> ParseResult<'_, SynTree<String, String>> {
  let (_, s) = needed_char('(', s)?;
  let s = skip_whitespace(s);
  let (label, s) = parse_atom(s).map_err(|e| -> Err { format!("label: {}", e).into() })?;

  let mut children = Vec::new();
  let mut end = pos;
  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    if let (Some(_), s) = optional_char(')', rem) {
      rem = s;
      break;
    }
    if rem.is_empty() {
      return Err(format!("unclosed constituent {}", label).into());
    }

    if rem.starts_with('(') {
      let (child, s) = parse_tree(rem, end)?;
      end = child.span().1;
      children.push(child);
      rem = s;
    } else {
      let (word, s) = parse_atom(rem).map_err(|e| -> Err { format!("word: {}", e).into() })?;
      children.push(SynTree::Leaf(Word {
        value: word.to_string(),
        span: (end, end + 1),
      }));
      end += 1;
      rem = s;
    }
  }

  if children.is_empty() {
    return Err(format!("constituent {} has no children", label).into());
  }

  Ok((
    SynTree::Branch(
      Constituent {
        value: label.to_string(),
        span: (pos, end),
      },
      children,
    ),
    rem,
  ))
}

/// Parses every tree in `s`. Trees are separated by any whitespace, so a
/// treebank can hold one tree per line or spread trees over several lines.
pub fn parse_trees(s: &str) -> Result<Vec<SynTree<String, String>>, Err> {
  let mut trees = Vec::new();
  let mut rem = skip_whitespace(s);
  while !rem.is_empty() {
    let (tree, s) =
      parse_tree(rem, 0).map_err(|e| -> Err { format!("tree {}: {}", trees.len() + 1, e).into() })?;
    trees.push(tree);
    rem = skip_whitespace(s);
  }
  Ok(trees)
}
