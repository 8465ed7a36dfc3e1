use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Half-open range of token positions `[start, end)`
pub type Span = (usize, usize);

/// A backpointer: how a symbol was derived over a span, and with what
/// probability.
#[derive(Debug, Clone, PartialEq)]
pub enum Derivation {
  /// `symbol -> word`, only on length-1 spans
  Leaf { prob: f64 },
  /// `symbol -> left right` with `left` over `[start, split)` and `right`
  /// over `[split, end)`
  Branch {
    split: usize,
    left: String,
    right: String,
    prob: f64,
  },
}

impl Derivation {
  pub fn prob(&self) -> f64 {
    match self {
      Self::Leaf { prob } | Self::Branch { prob, .. } => *prob,
    }
  }

  /// Orders equally probable derivations by `(split, left, right)`
  fn tie_key(&self) -> (usize, &str, &str) {
    match self {
      Self::Leaf { .. } => (0, "", ""),
      Self::Branch {
        split, left, right, ..
      } => (*split, left.as_str(), right.as_str()),
    }
  }

  /// Orders derivations so that the best one is the greatest: higher
  /// probability first, then the smaller `(split, left, right)`.
  pub fn preference(&self, other: &Self) -> Ordering {
    self
      .prob()
      .total_cmp(&other.prob())
      .then_with(|| other.tie_key().cmp(&self.tie_key()))
  }
}

impl fmt::Display for Derivation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Leaf { prob } => write!(f, "leaf [{}]", prob),
      Self::Branch {
        split,
        left,
        right,
        prob,
      } => write!(f, "{} {} @{} [{}]", left, right, split, prob),
    }
  }
}

/// The best derivation of a list under `Derivation::preference`
pub fn best_derivation(derivations: &[Derivation]) -> Option<&Derivation> {
  derivations.iter().max_by(|a, b| a.preference(b))
}

/// The highest probability of a list of derivations
pub fn best_prob(derivations: &[Derivation]) -> Option<f64> {
  derivations.iter().map(Derivation::prob).reduce(f64::max)
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Entry {
  derivations: Vec<Derivation>,
  best: f64,
}

/// Everything derivable over one span. A symbol is derivable exactly when it
/// has an entry, and every entry holds at least one derivation.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Cell(BTreeMap<String, Entry>);

impl Cell {
  /// Records a derivation of `symbol`, skipping exact duplicates
  pub(crate) fn add(&mut self, symbol: &str, derivation: Derivation) {
    let prob = derivation.prob();
    match self.0.get_mut(symbol) {
      Some(entry) => {
        if !entry.derivations.contains(&derivation) {
          entry.derivations.push(derivation);
          entry.best = entry.best.max(prob);
        }
      }
      None => {
        self.0.insert(
          symbol.to_string(),
          Entry {
            derivations: vec![derivation],
            best: prob,
          },
        );
      }
    }
  }

  pub(crate) fn symbols(&self) -> impl Iterator<Item = &str> {
    self.0.keys().map(String::as_str)
  }

  pub(crate) fn contains(&self, symbol: &str) -> bool {
    self.0.contains_key(symbol)
  }

  pub(crate) fn best_prob(&self, symbol: &str) -> Option<f64> {
    self.0.get(symbol).map(|e| e.best)
  }

  fn derivations(&self, symbol: &str) -> &[Derivation] {
    self.0.get(symbol).map(|e| e.derivations.as_slice()).unwrap_or(&[])
  }

  fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

/// Triangular table of derivable symbols and their derivations for every span
/// `[start, end)` of one input.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
  len: usize,
  cells: Vec<Cell>,
}

impl Chart {
  pub fn new(len: usize) -> Self {
    Self {
      len,
      cells: vec![Cell::default(); len * (len + 1) / 2],
    }
  }

  /// Number of input tokens the chart covers
  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// The whole input, `[0, len)`
  pub fn full_span(&self) -> Span {
    (0, self.len)
  }

  fn index(&self, (start, end): Span) -> Option<usize> {
    if start < end && end <= self.len {
      Some(end * (end - 1) / 2 + start)
    } else {
      None
    }
  }

  fn cell(&self, span: Span) -> Option<&Cell> {
    self.index(span).map(|idx| &self.cells[idx])
  }

  /// Replaces the cell for `span`. Out of range spans are a bug in the caller.
  pub(crate) fn set_cell(&mut self, span: Span, cell: Cell) {
    let idx = self
      .index(span)
      .unwrap_or_else(|| panic!("span {:?} outside chart of length {}", span, self.len));
    self.cells[idx] = cell;
  }

  pub(crate) fn cell_mut(&mut self, span: Span) -> &mut Cell {
    let idx = self
      .index(span)
      .unwrap_or_else(|| panic!("span {:?} outside chart of length {}", span, self.len));
    &mut self.cells[idx]
  }

  /// Symbols derivable over `span`, in symbol order
  pub fn derivable(&self, span: Span) -> impl Iterator<Item = &str> {
    self.cell(span).into_iter().flat_map(|c| c.symbols())
  }

  pub fn is_derivable(&self, span: Span, symbol: &str) -> bool {
    self.cell(span).is_some_and(|c| c.contains(symbol))
  }

  /// Every recorded derivation of `symbol` over `span`
  pub fn derivations(&self, span: Span, symbol: &str) -> &[Derivation] {
    self.cell(span).map(|c| c.derivations(symbol)).unwrap_or(&[])
  }

  /// The probability every parent uses for `symbol` over `span`
  pub fn best_prob(&self, span: Span, symbol: &str) -> Option<f64> {
    self.cell(span).and_then(|c| c.best_prob(symbol))
  }

  /// True if `symbol` covers the whole, non-empty input
  pub fn accepts(&self, symbol: &str) -> bool {
    self.is_derivable(self.full_span(), symbol)
  }

  /// All spans in the order they are filled: by length, then start
  pub fn spans(&self) -> impl Iterator<Item = Span> + use<> {
    let len = self.len;
    (1..=len).flat_map(move |width| (0..=len - width).map(move |start| (start, start + width)))
  }
}

impl fmt::Display for Chart {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for span in self.spans() {
      let Some(cell) = self.cell(span) else {
        continue;
      };
      if cell.is_empty() {
        continue;
      }
      writeln!(f, "Span {}..{}:", span.0, span.1)?;
      for symbol in cell.symbols() {
        for d in cell.derivations(symbol) {
          writeln!(f, "  {} -> {}", symbol, d)?;
        }
      }
    }
    Ok(())
  }
}
