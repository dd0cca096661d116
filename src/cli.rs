use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::level_filters::LevelFilter;
use tracing::debug;

use crate::diff::{Counters, Differ};
use crate::document::{decode, encode};
use crate::key::KeyOrder;
use crate::utils::read_input;

#[derive(Parser, Debug)]
#[command(
    name = "kyd",
    author,
    version,
    about = "Print the YAML documents of SECOND that do not appear in FIRST"
)]
pub struct Args {
    /// First YAML file (A)
    pub first: PathBuf,

    /// Second YAML file (B); its new documents are printed
    pub second: PathBuf,

    /// Treat mappings with the same entries in a different order as equal
    #[arg(long)]
    pub ignore_key_order: bool,

    /// Print a summary of the run on stderr
    #[arg(long)]
    pub stats: bool,

    /// Write the result to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// No log output at all
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug)]
pub struct Options {
    pub first: PathBuf,
    pub second: PathBuf,
    pub order: KeyOrder,
    pub stats: bool,
    pub output: Option<PathBuf>,
    pub log_level: LevelFilter,
}

pub fn build_options(args: &Args) -> Options {
    let log_level = if args.quiet {
        LevelFilter::OFF
    } else {
        match args.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    Options {
        first: args.first.clone(),
        second: args.second.clone(),
        order: if args.ignore_key_order {
            KeyOrder::Ignored
        } else {
            KeyOrder::Significant
        },
        stats: args.stats,
        output: args.output.clone(),
        log_level,
    }
}

/// Step of a run that an error is reported against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    OpenFirst,
    OpenSecond,
    DecodeFirst,
    DecodeSecond,
    Diff,
    Encode,
    Close,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::OpenFirst => "opening first file",
            Phase::OpenSecond => "opening second file",
            Phase::DecodeFirst => "decoding first file",
            Phase::DecodeSecond => "decoding second file",
            Phase::Diff => "diffing",
            Phase::Encode => "encoding",
            Phase::Close => "closing output",
        };
        f.write_str(s)
    }
}

/// Runs every phase in order. Output is written once, after the whole
/// result has been encoded; any error leaves it untouched.
pub fn run(opts: &Options) -> Result<Counters> {
    let first = read_input(&opts.first).context(Phase::OpenFirst)?;
    let second = read_input(&opts.second).context(Phase::OpenSecond)?;

    let a = decode(&first).context(Phase::DecodeFirst)?;
    let b = decode(&second).context(Phase::DecodeSecond)?;
    debug!(first = a.len(), second = b.len(), "inputs decoded");

    let result = Differ::new(opts.order)
        .diff(&a, &b)
        .context(Phase::Diff)?;

    let encoded = encode(result.documents.iter().copied()).context(Phase::Encode)?;
    write_output(opts.output.as_deref(), &encoded).context(Phase::Close)?;

    Ok(result.counters)
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> crate::Result<()> {
    match path {
        Some(path) => fs::write(path, bytes)?,
        None => {
            let mut out = io::stdout().lock();
            out.write_all(bytes)?;
            out.flush()?;
        }
    }
    Ok(())
}
