// The sequitur CLI.
// You can check a saved proof file, parse a single sentence, or list the
// rule table.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sequitur::proof::Verdict;
use sequitur::rules::Rule;
use sequitur::syntax::parser::{parse_sentence, Dialect};
use sequitur::syntax::token::validate;
use sequitur::verifier::{Verifier, VerifyStatus};

#[derive(Parser)]
#[clap(
    name = "sequitur",
    about = "A proof evaluation engine for line-by-line natural deduction",
    version = env!("CARGO_PKG_VERSION")
)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check every line of a saved proof file
    Check {
        /// The proof file to check
        #[clap(value_name = "FILE")]
        file: String,

        /// Skip checking the proof's goal list
        #[clap(long, help = "Skip checking the proof's goal list.")]
        no_goals: bool,
    },

    /// Parse a single sentence and print its canonical form
    Parse {
        /// The sentence text
        #[clap(value_name = "SENTENCE")]
        sentence: String,

        /// Use the Boolean-algebra grammar
        #[clap(long, help = "Use the Boolean-algebra grammar.")]
        boolean: bool,
    },

    /// List the rule table
    Rules,
}

fn main() {
    // Initialize tracing subscriber with env filter.
    // Use RUST_LOG to control log levels, e.g.:
    //   RUST_LOG=sequitur::evaluator=debug sequitur check foo.sq
    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).without_time())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();

    match args.command {
        Command::Check { file, no_goals } => {
            let mut verifier = Verifier::new(file.into());
            verifier.include_goals = !no_goals;

            let output = match verifier.run() {
                Ok(output) => output,
                Err(e) => {
                    println!("{}", e);
                    std::process::exit(1);
                }
            };

            for event in &output.events {
                match &event.verdict {
                    Verdict::Unevaluated => {}
                    verdict => println!("line {}: {} -- {}", event.line, event.text, verdict),
                }
            }
            if let Some(abort) = &output.abort {
                println!("evaluation stopped: {}", abort);
            }
            for goal in &output.goals {
                let mark = if goal.met { "reached" } else { "not reached" };
                println!("goal {}: {}", goal.text, mark);
            }
            if let Some(summary) = &output.summary {
                println!(
                    "{} lines evaluated: {} valid, {} invalid, {} errors",
                    summary.evaluated, summary.valid, summary.invalid, summary.errors
                );
            }

            match output.status {
                VerifyStatus::Good => {}
                VerifyStatus::Bad | VerifyStatus::Aborted => std::process::exit(1),
            }
        }

        Command::Parse { sentence, boolean } => {
            let dialect = if boolean {
                Dialect::Boolean
            } else {
                Dialect::Predicate
            };
            if !validate(&sentence) {
                println!("not a sentence: unbalanced parentheses or illegal characters");
                std::process::exit(1);
            }
            match parse_sentence(&sentence, dialect) {
                Ok(expr) => println!("{}", expr),
                Err(e) => {
                    println!("{}", e);
                    std::process::exit(1);
                }
            }
        }

        Command::Rules => {
            for rule in Rule::all() {
                println!(
                    "{:2}  {:28} {:?}{}",
                    rule.id(),
                    rule.display_name(),
                    rule.category(),
                    if rule.boolean_legal() {
                        "  (boolean mode)"
                    } else {
                        ""
                    }
                );
            }
        }
    }
}
