use std::env;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::process;

use tracing::info;
use tracing_subscriber::EnvFilter;

use pcky::estimate::{estimate, Annotation};
use pcky::treebank::parse_trees;
use pcky::{parse_lines, Err, Grammar, OutputOptions, Tokenizer};

fn usage(prog_name: &str) -> String {
  format!(
    r"Usage: {0} parse GRAMMAR SENTENCES OUTPUT [options]
       {0} train TREEBANK OUTPUT [options]

Parse options:
  -w, --whitespace          Split sentences on whitespace only (defaults to
                            splitting off punctuation and clitics)
  -s, --strip-annotations   Drop ^parent suffixes from output labels

Train options:
  -p, --parent              Annotate nonterminals with their parent's label

  -h, --help                Print this message

Set RUST_LOG (e.g. RUST_LOG=debug) for diagnostics on stderr.",
    prog_name
  )
}

enum Command {
  Parse {
    grammar: String,
    sentences: String,
    output: String,
    tokenizer: Tokenizer,
    options: OutputOptions,
  },
  Train {
    treebank: String,
    output: String,
    annotation: Annotation,
  },
}

impl Command {
  fn make_error_message(msg: &str, prog_name: impl AsRef<str>) -> String {
    format!("argument error: {}.\n\n{}", msg, usage(prog_name.as_ref()))
  }

  fn parse(v: Vec<String>) -> Result<Self, String> {
    let mut iter = v.into_iter();
    let prog_name = iter.next().unwrap_or_else(|| "pcky".to_string());

    let mut positional = Vec::new();
    let mut whitespace = false;
    let mut strip_annotations = false;
    let mut parent = false;

    for o in iter {
      if o == "-h" || o == "--help" {
        println!("{}", usage(&prog_name));
        process::exit(0);
      } else if o == "-w" || o == "--whitespace" {
        whitespace = true;
      } else if o == "-s" || o == "--strip-annotations" {
        strip_annotations = true;
      } else if o == "-p" || o == "--parent" {
        parent = true;
      } else if o.starts_with('-') && o.len() > 1 {
        return Err(Self::make_error_message(&format!("unknown option {}", o), &prog_name));
      } else {
        positional.push(o);
      }
    }

    let mut positional = positional.into_iter();
    match positional.next().as_deref() {
      Some("parse") => {
        if parent {
          return Err(Self::make_error_message("--parent only applies to train", &prog_name));
        }
        match (positional.next(), positional.next(), positional.next(), positional.next()) {
          (Some(grammar), Some(sentences), Some(output), None) => Ok(Self::Parse {
            grammar,
            sentences,
            output,
            tokenizer: if whitespace {
              Tokenizer::Whitespace
            } else {
              Tokenizer::Words
            },
            options: OutputOptions { strip_annotations },
          }),
          _ => Err(Self::make_error_message(
            "parse takes GRAMMAR SENTENCES OUTPUT",
            &prog_name,
          )),
        }
      }
      Some("train") => {
        if whitespace || strip_annotations {
          return Err(Self::make_error_message("parse options given to train", &prog_name));
        }
        match (positional.next(), positional.next(), positional.next()) {
          (Some(treebank), Some(output), None) => Ok(Self::Train {
            treebank,
            output,
            annotation: if parent {
              Annotation::Parent
            } else {
              Annotation::None
            },
          }),
          _ => Err(Self::make_error_message("train takes TREEBANK OUTPUT", &prog_name)),
        }
      }
      Some(other) => Err(Self::make_error_message(
        &format!("unknown command {}", other),
        &prog_name,
      )),
      None => Err(Self::make_error_message("missing command", &prog_name)),
    }
  }
}

fn run(command: Command) -> Result<(), Err> {
  match command {
    Command::Parse {
      grammar,
      sentences,
      output,
      tokenizer,
      options,
    } => {
      // a bad grammar or a missing input aborts before the output is created
      let g = Grammar::read_from_file(&grammar)?;
      let input = File::open(&sentences)
        .map_err(|e| -> Err { format!("opening {}: {}", sentences, e).into() })?;
      let out = File::create(&output)
        .map_err(|e| -> Err { format!("creating {}: {}", output, e).into() })?;

      let stats = parse_lines(
        &g,
        tokenizer,
        BufReader::new(input),
        BufWriter::new(out),
        options,
      )?;
      info!(output = %output, failed = stats.failed, "done");
    }
    Command::Train {
      treebank,
      output,
      annotation,
    } => {
      let src = fs::read_to_string(&treebank)
        .map_err(|e| -> Err { format!("reading {}: {}", treebank, e).into() })?;
      let trees = parse_trees(&src)?;
      let g = estimate(&trees, annotation)?;
      fs::write(&output, g.to_string())
        .map_err(|e| -> Err { format!("writing {}: {}", output, e).into() })?;
      info!(trees = trees.len(), rules = g.len(), output = %output, "wrote grammar");
    }
  }
  Ok(())
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    )
    .with_writer(std::io::stderr)
    .init();

  let command = match Command::parse(env::args().collect()) {
    Ok(command) => command,
    Err(msg) => {
      eprintln!("{}", msg);
      process::exit(255);
    }
  };

  if let Err(e) = run(command) {
    eprintln!("fatal: {}", e);
    process::exit(1);
  }
}
