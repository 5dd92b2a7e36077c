//! epubnorm — normalize HTML exports into e-book XHTML
//!
//! - html      : note-taking export (well-formed XHTML) → tree passes, pretty-print.
//! - odt       : word-processor HTML export → attribute stripping, footnotes as <aside>.
//! - simple    : evernote-style export → substitution chain, pretty-print, touch-ups.
//! - questions : <ol> of question/answer items → question/answer paragraphs.
//!
//! CLI flags:
//!   --strict    : parse the input as XML; any parse error aborts
//!   --lenient   : parse the input as real-world HTML
//!   --wrap N    : pretty-printer line width
//! Default: `html` is strict, `odt` and `simple` lenient. --lenient wins if both are present.
//! `questions` is plain text substitution and takes no flags.
//! Output defaults to overwriting the input.

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use epubnorm::{ParseMode, Profile};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// CLI flags
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize a note-taking HTML export
    Html(FileArgs),
    /// Normalize a word-processor HTML export (footnote aware)
    Odt(FileArgs),
    /// Normalize an evernote-style export by substitution
    Simple(FileArgs),
    /// Turn a question/answer list into paragraphs
    Questions(InPlaceArgs),
}

#[derive(Args)]
struct FileArgs {
    /// Force strict XML parsing
    #[arg(long, action = ArgAction::SetTrue)]
    strict: bool,

    /// Force lenient HTML parsing
    #[arg(long, action = ArgAction::SetTrue)]
    lenient: bool,

    /// Maximum line width of the pretty-printed output
    #[arg(long)]
    wrap: Option<usize>,

    /// Input file
    input: PathBuf,

    /// Output file (default: overwrite input)
    output: Option<PathBuf>,
}

#[derive(Args)]
struct InPlaceArgs {
    /// Input file
    input: PathBuf,

    /// Output file (default: overwrite input)
    output: Option<PathBuf>,
}

impl FileArgs {
    fn profile(&self, base: Profile) -> Profile {
        // Precedence: explicit flags override the variant default; --lenient wins if both are present.
        let mode = if self.lenient {
            ParseMode::Lenient
        } else if self.strict {
            ParseMode::Strict
        } else {
            base.parse_mode
        };
        let wrap = self.wrap.unwrap_or(base.wrap);
        base.with_parse_mode(mode).with_wrap(wrap)
    }

    fn output(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.input)
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    type Normalizer = fn(&Path, &Path, &Profile) -> epubnorm::Result<i32>;

    let (args, base, normalize): (&FileArgs, Profile, Normalizer) = match &cli.command {
        Command::Html(args) => (args, Profile::html(), epubnorm::normalize_html_file as Normalizer),
        Command::Odt(args) => (args, Profile::odt(), epubnorm::normalize_odt_file as Normalizer),
        Command::Simple(args) => (
            args,
            Profile::simple(),
            epubnorm::normalize_simple_file as Normalizer,
        ),
        Command::Questions(args) => {
            let output = args.output.as_deref().unwrap_or(&args.input);
            return epubnorm::normalize_questions_file(&args.input, output)
                .with_context(|| format!("normalizing {}", args.input.display()));
        }
    };
    let profile = args.profile(base);
    log::debug!("{profile:?}");
    let status = normalize(&args.input, args.output(), &profile)
        .with_context(|| format!("normalizing {}", args.input.display()))?;
    Ok(status)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
