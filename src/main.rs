use std::process::ExitCode;

use clap::Parser;

use kyd::logging::init_logging;
use kyd::{build_options, run, Args, Counters};

fn print_summary(counters: &Counters) {
    eprintln!("== kyd: Summary ==");
    eprintln!("First documents:      {}", counters.first_docs);
    eprintln!("First distinct:       {}", counters.first_keys);
    eprintln!("Second documents:     {}", counters.second_docs);
    eprintln!("Already in first:     {}", counters.suppressed);
    eprintln!("Emitted:              {}", counters.emitted);
}

fn main() -> ExitCode {
    let args = Args::parse();
    let opts = build_options(&args);

    if let Err(err) = init_logging(opts.log_level) {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    match run(&opts) {
        Ok(counters) => {
            if opts.stats {
                print_summary(&counters);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
