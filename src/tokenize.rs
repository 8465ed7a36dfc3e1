use regex::Regex;

use crate::parse_grammar::regex_static;

/// How raw sentence text is split into the tokens the grammar's terminals
/// are matched against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tokenizer {
  /// Words, clitics and punctuation marks, roughly as a treebank tokenizer
  /// splits them: `the dog's bone.` -> `the dog 's bone .`
  #[default]
  Words,
  /// Whatever lies between runs of whitespace
  Whitespace,
}

impl Tokenizer {
  pub fn tokenize<'a>(&self, sentence: &'a str) -> Vec<&'a str> {
    regex_static!(WORD, r"\w+(?:[-.]\w+)*|'\w+|[^\w\s]");
    match self {
      Self::Words => WORD.find_iter(sentence).map(|m| m.as_str()).collect(),
      Self::Whitespace => sentence.split_whitespace().collect(),
    }
  }
}
