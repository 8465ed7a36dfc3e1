use std::collections::BTreeMap;

use tracing::debug;

use crate::grammar::{Grammar, GrammarError};
use crate::rules::{Production, Rule};
use crate::syntree::{Constituent, SynTree, Word};
use crate::Err;

/// Extra context folded into nonterminal labels while counting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Annotation {
  #[default]
  None,
  /// Label every non-root node with its parent's label: `NP` under `S`
  /// becomes `NP^S`
  Parent,
}

fn annotate(label: &str, parent: Option<&str>, annotation: Annotation) -> String {
  match (annotation, parent) {
    (Annotation::Parent, Some(parent)) => format!("{}^{}", label, parent),
    _ => label.to_string(),
  }
}

/// Rule frequencies gathered from a CNF treebank.
///
/// Counting consumes the accumulator and hands it back, so estimates only
/// depend on the trees fed in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleCounts {
  rules: BTreeMap<(String, Vec<Production>), usize>,
  heads: BTreeMap<String, usize>,
  roots: BTreeMap<String, usize>,
  trees: usize,
}

impl RuleCounts {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of trees counted so far
  pub fn trees(&self) -> usize {
    self.trees
  }

  /// How often `head -> productions` was seen
  pub fn count(&self, head: &str, productions: &[Production]) -> usize {
    self
      .rules
      .get(&(head.to_string(), productions.to_vec()))
      .copied()
      .unwrap_or(0)
  }

  /// Adds every rule used in `tree`. Fails if the tree isn't CNF: each
  /// constituent needs exactly one word or exactly two constituents below it.
  pub fn count_tree(
    mut self,
    tree: &SynTree<String, String>,
    annotation: Annotation,
  ) -> Result<Self, Err> {
    let (root, _) = tree
      .get_branch()
      .ok_or_else(|| -> Err { "tree is a bare word".into() })?;
    self.count_node(tree, None, annotation)?;
    *self.roots.entry(root.value.clone()).or_default() += 1;
    self.trees += 1;
    Ok(self)
  }

  fn count_node(
    &mut self,
    node: &SynTree<String, String>,
    parent: Option<&str>,
    annotation: Annotation,
  ) -> Result<(), Err> {
    let (cons, children) = match node {
      SynTree::Branch(cons, children) => (cons, children),
      SynTree::Leaf(w) => {
        return Err(
          format!(
            "word {} at {}..{} has no preterminal",
            w.value, w.span.0, w.span.1
          )
          .into(),
        );
      }
    };

    let productions = match children.as_slice() {
      [SynTree::Leaf(word)] => vec![Production::Terminal(word.value.clone())],
      [left @ SynTree::Branch(l, _), right @ SynTree::Branch(r, _)] => {
        self.count_node(left, Some(&cons.value), annotation)?;
        self.count_node(right, Some(&cons.value), annotation)?;
        vec![
          Production::Nonterminal(annotate(&l.value, Some(&cons.value), annotation)),
          Production::Nonterminal(annotate(&r.value, Some(&cons.value), annotation)),
        ]
      }
      _ => {
        return Err(
          format!(
            "constituent {} at {}..{} is not in chomsky normal form",
            cons.value, cons.span.0, cons.span.1
          )
          .into(),
        );
      }
    };

    let head = annotate(&cons.value, parent, annotation);
    *self.heads.entry(head.clone()).or_default() += 1;
    *self.rules.entry((head, productions)).or_default() += 1;
    Ok(())
  }

  /// Turns counts into a grammar where `P(A -> β) = count(A -> β) / count(A)`.
  /// The start symbol is the most frequent root label, the alphabetically
  /// first one on ties.
  pub fn into_grammar(self) -> Result<Grammar, Err> {
    let start = self
      .roots
      .iter()
      .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
      .map(|(root, _)| root.clone())
      .ok_or(GrammarError::NoStartSymbol)?;

    let mut rules = Vec::with_capacity(self.rules.len());
    for ((head, productions), n) in self.rules {
      let total = self.heads.get(&head).copied().unwrap_or(n);
      rules.push(Rule::new(head, productions, n as f64 / total as f64));
    }

    debug!(trees = self.trees, rules = rules.len(), start = %start, "estimated grammar");
    Ok(Grammar::new(rules, start)?)
  }
}

/// Estimates a grammar from a whole treebank
pub fn estimate<'a>(
  trees: impl IntoIterator<Item = &'a SynTree<String, String>>,
  annotation: Annotation,
) -> Result<Grammar, Err> {
  trees
    .into_iter()
    .try_fold(RuleCounts::new(), |counts, tree| counts.count_tree(tree, annotation))?
    .into_grammar()
}

/// Drops `^parent` suffixes, turning a tree parsed with an annotated grammar
/// back into one over the treebank's own labels
pub fn strip_parent_annotation(tree: &SynTree<String, String>) -> SynTree<String, String> {
  tree.map(
    &|c: &Constituent<String>| match c.value.split_once('^') {
      Some((label, _)) if !label.is_empty() => label.to_string(),
      _ => c.value.clone(),
    },
    &|w: &Word<String>| w.value.clone(),
  )
}
