use std::fmt;

use tracing::debug;

use crate::chart::{best_derivation, Chart, Derivation, Span};
use crate::syntree::{Constituent, SynTree, Word};

/// The single most probable parse of an input
#[derive(Debug, Clone, PartialEq)]
pub struct Parse {
  pub tree: SynTree<String, String>,
  pub prob: f64,
}

impl fmt::Display for Parse {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if f.alternate() {
      write!(f, "{:#}", self.tree)
    } else {
      write!(f, "{}", self.tree)
    }
  }
}

/// Extracts the best tree for `symbol` over `span` from a filled chart.
///
/// Returns `None` if `symbol` isn't derivable there. Among equally probable
/// derivations the one with the smallest `(split, left, right)` is taken, so
/// the result doesn't depend on the order derivations were recorded in.
pub fn best_parse(chart: &Chart, input: &[&str], span: Span, symbol: &str) -> Option<Parse> {
  if chart.len() != input.len() {
    debug!(
      chart = chart.len(),
      input = input.len(),
      "chart was built for a different input"
    );
    return None;
  }

  let prob = chart.best_prob(span, symbol)?;
  let tree = extract(chart, input, span, symbol)?;
  Some(Parse { tree, prob })
}

/// Recursively rebuilds the tree headed by `symbol` over `span`. Depth is
/// bounded by the span length.
fn extract(
  chart: &Chart,
  input: &[&str],
  span: Span,
  symbol: &str,
) -> Option<SynTree<String, String>> {
  let (start, end) = span;

  let children = match best_derivation(chart.derivations(span, symbol))? {
    Derivation::Leaf { .. } => vec![SynTree::Leaf(Word {
      value: input.get(start)?.to_string(),
      span,
    })],
    Derivation::Branch {
      split, left, right, ..
    } => vec![
      extract(chart, input, (start, *split), left)?,
      extract(chart, input, (*split, end), right)?,
    ],
  };

  Some(SynTree::Branch(
    Constituent {
      value: symbol.to_string(),
      span,
    },
    children,
  ))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cky::parse_chart;
  use crate::grammar::Grammar;

  fn best(g: &Grammar, input: &[&str]) -> Option<Parse> {
    let chart = parse_chart(g, input);
    best_parse(&chart, input, chart.full_span(), g.start())
  }

  #[test]
  fn test_dog_barks() {
    let g: Grammar = r#"
      %start S
      S -> NP VP [1.0]
      NP -> "dog" [1.0]
      VP -> "barks" [1.0]
    "#
    .parse()
    .unwrap();

    let parse = best(&g, &["dog", "barks"]).unwrap();
    assert_eq!(parse.to_string(), "(S (NP dog) (VP barks))");
    assert_eq!(parse.prob, 1.0);
    assert_eq!(parse.tree.span(), (0, 2));

    assert_eq!(best(&g, &["cat", "meows"]), None);
    assert_eq!(best(&g, &[]), None);
  }

  #[test]
  fn test_subspans() {
    let g: Grammar = r#"
      S -> NP VP [1.0]
      NP -> Det N [1.0]
      Det -> "the" [1.0]
      N -> "dog" [1.0]
      VP -> "barked" [1.0]
    "#
    .parse()
    .unwrap();

    let input = ["the", "dog", "barked"];
    let chart = parse_chart(&g, &input);
    let np = best_parse(&chart, &input, (0, 2), "NP").unwrap();
    assert_eq!(np.to_string(), "(NP (Det the) (N dog))");
    assert_eq!(best_parse(&chart, &input, (1, 3), "NP"), None);
    assert_eq!(best_parse(&chart, &input, (0, 9), "S"), None);
    assert_eq!(best_parse(&chart, &input[..2], (0, 2), "NP"), None);
  }

  #[test]
  fn test_tie_break_prefers_earliest_split() {
    let g: Grammar = r#"
      S -> S S [0.5]
      S -> "x" [0.5]
    "#
    .parse()
    .unwrap();

    let parse = best(&g, &["x", "x", "x"]).unwrap();
    assert_eq!(parse.to_string(), "(S (S x) (S (S x) (S x)))");
    assert!((parse.prob - 0.5f64.powi(5)).abs() < 1e-12);
  }

  #[test]
  fn test_tie_break_prefers_smaller_symbols() {
    // both readings have probability 0.5 and split at 1
    let g: Grammar = r#"
      S -> B A [0.5] | A B [0.5]
      A -> "x" [1.0]
      B -> "x" [1.0]
    "#
    .parse()
    .unwrap();

    assert_eq!(best(&g, &["x", "x"]).unwrap().to_string(), "(S (A x) (B x))");
  }

  const PP_ATTACHMENT: &str = r#"
    %start S
    S -> NP VP [1.0]
    VP -> V NP [0.6] | VP PP [0.4]
    NP -> NP PP [0.2] | Det N [0.5] | "i" [0.3]
    PP -> P NP [1.0]
    V -> "saw" [1.0]
    Det -> "the" [1.0]
    N -> "man" [0.5] | "telescope" [0.5]
    P -> "with" [1.0]
  "#;

  #[test]
  fn test_prefers_more_probable_attachment() {
    let input = "i saw the man with the telescope".split(' ').collect::<Vec<_>>();

    let g: Grammar = PP_ATTACHMENT.parse().unwrap();
    let parse = best(&g, &input).unwrap();
    assert_eq!(
      parse.to_string(),
      "(S (NP i) (VP (VP (V saw) (NP (Det the) (N man))) (PP (P with) (NP (Det the) (N telescope)))))"
    );
    assert!((parse.prob - 0.0045).abs() < 1e-12);

    // make noun attachment the likelier reading
    let g: Grammar = PP_ATTACHMENT
      .replace("NP -> NP PP [0.2] | Det N [0.5]", "NP -> NP PP [0.5] | Det N [0.2]")
      .parse()
      .unwrap();
    let parse = best(&g, &input).unwrap();
    assert_eq!(
      parse.to_string(),
      "(S (NP i) (VP (V saw) (NP (NP (Det the) (N man)) (PP (P with) (NP (Det the) (N telescope))))))"
    );
    assert!((parse.prob - 0.0009).abs() < 1e-12);
  }

  #[test]
  fn test_deterministic() {
    let g: Grammar = PP_ATTACHMENT.parse().unwrap();
    let input = "i saw the man with the telescope".split(' ').collect::<Vec<_>>();
    let first = best(&g, &input);
    for _ in 0..5 {
      assert_eq!(best(&g, &input), first);
    }
  }
}
