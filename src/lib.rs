#[macro_use]
extern crate lazy_static;

pub mod batch;
pub mod chart;
pub mod cky;
pub mod estimate;
pub mod grammar;
pub mod parse_grammar;
pub mod rules;
pub mod syntree;
pub mod tokenize;
pub mod treebank;
pub mod utils;
pub mod viterbi;

use crate::cky::parse_chart;
use crate::viterbi::best_parse;

pub use crate::batch::{parse_lines, BatchStats, OutputOptions};
pub use crate::chart::{Chart, Derivation, Span};
pub use crate::grammar::{Grammar, GrammarError};
pub use crate::tokenize::Tokenizer;
pub use crate::utils::Err;
pub use crate::viterbi::Parse;

impl Grammar {
  pub fn parse_chart(&self, input: &[&str]) -> Chart {
    parse_chart(self, input)
  }

  /// The most probable parse of `input` headed by the start symbol, or `None`
  /// if the grammar can't derive it
  pub fn parse(&self, input: &[&str]) -> Option<Parse> {
    let chart = self.parse_chart(input);
    if !chart.accepts(self.start()) {
      return None;
    }
    best_parse(&chart, input, chart.full_span(), self.start())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::rules::Production;
  use crate::syntree::SynTree;

  const AMBIGUOUS: &str = r#"
    %start S
    S -> S S [0.3] | A B [0.3] | B A [0.2] | "a" [0.1] | "b" [0.1]
    A -> A S [0.4] | "a" [0.6]
    B -> S B [0.5] | "b" [0.5]
  "#;

  fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-12 * a.abs().max(b.abs())
  }

  /// Every derivation of `symbol` over `input` as (probability, tree), found
  /// by trying every rule at every split without any chart
  fn all_derivations(g: &Grammar, input: &[&str], symbol: &str) -> Vec<(f64, String)> {
    let mut out = Vec::new();
    for rule in g.rules().iter().filter(|r| r.head == symbol) {
      match rule.productions.as_slice() {
        [Production::Terminal(w)] if input.len() == 1 && input[0] == w => {
          out.push((rule.prob, format!("({} {})", symbol, w)));
        }
        [Production::Nonterminal(l), Production::Nonterminal(r)] if input.len() > 1 => {
          for split in 1..input.len() {
            for (lp, lt) in all_derivations(g, &input[..split], l) {
              for (rp, rt) in all_derivations(g, &input[split..], r) {
                out.push((rule.prob * lp * rp, format!("({} {} {})", symbol, lt, rt)));
              }
            }
          }
        }
        _ => {}
      }
    }
    out
  }

  /// Every string over {a, b} up to `max_len` long
  fn inputs(max_len: usize) -> Vec<Vec<&'static str>> {
    let mut all: Vec<Vec<&'static str>> = vec![Vec::new()];
    let mut frontier = all.clone();
    for _ in 0..max_len {
      frontier = frontier
        .into_iter()
        .flat_map(|prefix| {
          ["a", "b"].into_iter().map(move |w| {
            let mut next = prefix.clone();
            next.push(w);
            next
          })
        })
        .collect();
      all.extend(frontier.iter().cloned());
    }
    all
  }

  /// Probability of a finished tree recomputed from the grammar's rules
  fn tree_prob(g: &Grammar, tree: &SynTree<String, String>) -> f64 {
    let Some((cons, children)) = tree.get_branch() else {
      return 1.0;
    };
    match children.as_slice() {
      [SynTree::Leaf(w)] => g
        .terminal_rules(&w.value)
        .iter()
        .find(|(head, _)| *head == cons.value)
        .map(|(_, p)| *p)
        .unwrap(),
      [left, right] => {
        let (l, _) = left.get_branch().unwrap();
        let (r, _) = right.get_branch().unwrap();
        let rule = g
          .binary_rules_by_left(&l.value)
          .iter()
          .find(|b| b.head == cons.value && b.right == r.value)
          .unwrap();
        rule.prob * tree_prob(g, left) * tree_prob(g, right)
      }
      _ => panic!("not a CNF tree: {}", tree),
    }
  }

  #[test]
  fn test_scenario() {
    let g: Grammar = r#"
      %start S
      S -> NP VP [1.0]
      NP -> "dog" [1.0]
      VP -> "barks" [1.0]
    "#
    .parse()
    .unwrap();

    assert_eq!(
      g.parse(&["dog", "barks"]).unwrap().to_string(),
      "(S (NP dog) (VP barks))"
    );
    assert_eq!(g.parse(&["cat", "meows"]), None);
    assert_eq!(g.parse(&[]), None);
  }

  #[test]
  fn test_matches_exhaustive_search() {
    let g: Grammar = AMBIGUOUS.parse().unwrap();

    for input in inputs(5) {
      let chart = g.parse_chart(&input);
      let parse = g.parse(&input);
      let derivations = all_derivations(&g, &input, g.start());

      // completeness, both ways
      assert_eq!(chart.accepts(g.start()), !derivations.is_empty(), "{:?}", input);
      assert_eq!(parse.is_some(), !derivations.is_empty(), "{:?}", input);

      let Some(parse) = parse else {
        continue;
      };
      let best = derivations.iter().map(|(p, _)| *p).fold(0.0, f64::max);

      // optimality: nothing found by brute force beats the chart
      assert!(close(parse.prob, best), "{:?}: {} vs {}", input, parse.prob, best);
      assert!(close(tree_prob(&g, &parse.tree), parse.prob), "{:?}", input);

      // the returned tree is one of the derivations with that probability
      let text = parse.to_string();
      assert!(
        derivations.iter().any(|(p, t)| *t == text && close(*p, best)),
        "{:?}: {}",
        input,
        text
      );

      // soundness of the yield
      assert_eq!(parse.tree.leaves(), input, "{}", text);
    }
  }

  #[test]
  fn test_every_span_matches_exhaustive_search() {
    let g: Grammar = AMBIGUOUS.parse().unwrap();
    let input = ["a", "b", "a", "a", "b"];
    let chart = g.parse_chart(&input);

    for (start, end) in chart.spans() {
      for symbol in ["S", "A", "B"] {
        let derivations = all_derivations(&g, &input[start..end], symbol);
        assert_eq!(
          chart.is_derivable((start, end), symbol),
          !derivations.is_empty(),
          "{} over {}..{}",
          symbol,
          start,
          end
        );
        if let Some(best) = chart.best_prob((start, end), symbol) {
          let brute = derivations.iter().map(|(p, _)| *p).fold(0.0, f64::max);
          assert!(close(best, brute), "{} over {}..{}", symbol, start, end);
        }
      }
    }
  }

  #[test]
  fn test_recorded_probabilities_compose() {
    let g: Grammar = AMBIGUOUS.parse().unwrap();
    let input = ["b", "a", "b", "a", "a", "b"];
    let chart = g.parse_chart(&input);

    for span in chart.spans() {
      for symbol in chart.derivable(span) {
        let derivations = chart.derivations(span, symbol);
        assert!(!derivations.is_empty());

        let best = chart.best_prob(span, symbol).unwrap();
        assert!(derivations.iter().all(|d| d.prob() <= best));
        assert!(derivations.iter().any(|d| d.prob() == best));

        for d in derivations {
          let Derivation::Branch {
            split,
            left,
            right,
            prob,
          } = d
          else {
            assert_eq!(span.1 - span.0, 1);
            continue;
          };
          assert!(span.0 < *split && *split < span.1);
          let rule = g
            .binary_rules_by_left(left)
            .iter()
            .find(|b| b.head == symbol && b.right == *right)
            .unwrap();
          let left_best = chart.best_prob((span.0, *split), left).unwrap();
          let right_best = chart.best_prob((*split, span.1), right).unwrap();
          assert_eq!(*prob, rule.prob * left_best * right_best);
        }
      }
    }
  }

  #[test]
  fn test_shared_across_threads() {
    let g: Grammar = AMBIGUOUS.parse().unwrap();
    let inputs = inputs(4);
    let expected = inputs
      .iter()
      .map(|i| g.parse(i).map(|p| p.to_string()))
      .collect::<Vec<_>>();

    let g = &g;
    let results = std::thread::scope(|s| {
      let handles = inputs
        .iter()
        .map(|i| s.spawn(move || g.parse(i).map(|p| p.to_string())))
        .collect::<Vec<_>>();
      handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .collect::<Vec<_>>()
    });

    assert_eq!(results, expected);
  }
}
