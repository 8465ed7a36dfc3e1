use std::io::{BufRead, Write};

use tracing::{debug, info, warn};

use crate::estimate::strip_parent_annotation;
use crate::grammar::Grammar;
use crate::tokenize::Tokenizer;
use crate::Err;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputOptions {
  /// Write labels without their `^parent` annotation
  pub strip_annotations: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
  pub sentences: usize,
  pub parsed: usize,
  pub failed: usize,
}

/// Parses one sentence per input line and writes one bracketed tree per
/// output line. Empty, unparsable and non-UTF-8 sentences produce empty
/// lines, so the output always has exactly as many lines as the input.
pub fn parse_lines<R: BufRead, W: Write>(
  g: &Grammar,
  tokenizer: Tokenizer,
  mut input: R,
  mut output: W,
  options: OutputOptions,
) -> Result<BatchStats, Err> {
  let mut stats = BatchStats::default();
  let mut buf = Vec::new();

  for idx in 0.. {
    buf.clear();
    if input.read_until(b'\n', &mut buf)? == 0 {
      break;
    }
    stats.sentences += 1;

    let raw = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    let Ok(line) = std::str::from_utf8(raw) else {
      stats.failed += 1;
      warn!(line = idx + 1, "sentence is not valid utf-8, skipping");
      writeln!(output)?;
      continue;
    };
    let tokens = tokenizer.tokenize(line);

    match g.parse(&tokens) {
      Some(parse) => {
        stats.parsed += 1;
        if options.strip_annotations {
          writeln!(output, "{}", strip_parent_annotation(&parse.tree))?;
        } else {
          writeln!(output, "{}", parse)?;
        }
      }
      None => {
        stats.failed += 1;
        debug!(line = idx + 1, tokens = tokens.len(), "no parse");
        writeln!(output)?;
      }
    }
  }

  output.flush()?;
  info!(
    sentences = stats.sentences,
    parsed = stats.parsed,
    failed = stats.failed,
    "parsed sentences"
  );
  Ok(stats)
}
