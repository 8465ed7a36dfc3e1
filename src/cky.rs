use tracing::{debug, trace};

use crate::chart::{Cell, Chart, Derivation};
use crate::grammar::Grammar;

/// Fills a chart for `input` bottom-up.
///
/// Length-1 spans are seeded from the lexical rules, then spans are combined
/// in strictly increasing length so that both halves of every split are
/// final before they are read. A parent's probability always uses the best
/// probability recorded for each child.
pub fn parse_chart(g: &Grammar, input: &[&str]) -> Chart {
  let len = input.len();
  let mut chart = Chart::new(len);

  for (i, word) in input.iter().enumerate() {
    let rules = g.terminal_rules(word);
    if rules.is_empty() {
      debug!(position = i, word, "no lexical rule for token");
    }
    let cell = chart.cell_mut((i, i + 1));
    for (head, prob) in rules {
      cell.add(head, Derivation::Leaf { prob: *prob });
    }
  }

  for width in 2..=len {
    for start in 0..=len - width {
      let end = start + width;
      let cell = combine(g, &chart, start, end);
      chart.set_cell((start, end), cell);
    }
    trace!(width, "filled spans");
  }

  chart
}

/// Builds the cell for `[start, end)` from every split of already filled cells
fn combine(g: &Grammar, chart: &Chart, start: usize, end: usize) -> Cell {
  let mut cell = Cell::default();

  for split in start + 1..end {
    let left_span = (start, split);
    let right_span = (split, end);

    for left in chart.derivable(left_span) {
      let Some(left_prob) = chart.best_prob(left_span, left) else {
        continue;
      };

      for rule in g.binary_rules_by_left(left) {
        let Some(right_prob) = chart.best_prob(right_span, &rule.right) else {
          continue;
        };

        cell.add(
          &rule.head,
          Derivation::Branch {
            split,
            left: left.to_string(),
            right: rule.right.clone(),
            prob: rule.prob * left_prob * right_prob,
          },
        );
      }
    }
  }

  cell
}
