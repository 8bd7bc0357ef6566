use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};

mod harness;
mod oracle;
mod suite;
mod toolchain;

use harness::Harness;
use suite::{Lab, Suite};
use toolchain::{Platform, Toolchain};

#[derive(Parser, Debug)]
#[command(author, version, about = "lab build + output checker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check the string splitter (mystringtest.c + mystring.c)
    Strsplit(RunArgs),
    /// Check the line counter (wc.c)
    Wc(RunArgs),
    /// Check the longest-word finder (longest.c)
    Longest(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Directory holding the lab sources; compiler and subject run here
    #[arg(short, long, default_value = ".")]
    workdir: PathBuf,
    /// Sample directory, relative to the working directory
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,
    /// Only check samples whose path contains this filter
    #[arg(short, long)]
    filter: Option<String>,
    /// Print build and per-sample execution details
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

pub(crate) static VERBOSE: AtomicBool = AtomicBool::new(false);

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let (lab, args) = match cli.command {
        Commands::Strsplit(args) => (Lab::Strsplit, args),
        Commands::Wc(args) => (Lab::Wc, args),
        Commands::Longest(args) => (Lab::Longest, args),
    };
    VERBOSE.store(args.verbose, Ordering::Relaxed);
    run_lab(lab, args)
}

fn run_lab(lab: Lab, args: RunArgs) -> Result<ExitCode> {
    let suite = lab.suite();
    let toolchain = Toolchain::for_suite(&suite, Platform::host());
    run_suite(&toolchain, suite, args, &mut io::stdout().lock())
}

/// Builds once, then checks every sample. Only a failed build changes the
/// exit code.
fn run_suite(
    toolchain: &Toolchain,
    suite: Suite,
    args: RunArgs,
    out: &mut impl Write,
) -> Result<ExitCode> {
    let subject = match toolchain.build(&args.workdir) {
        Ok(subject) => subject,
        Err(e) => {
            if VERBOSE.load(Ordering::Relaxed) {
                println!("[build] {} failed: {e:#}", suite.name);
            }
            writeln!(out, "Compilation Failed.")?;
            return Ok(ExitCode::from(1));
        }
    };

    let harness = Harness::new(subject, suite, args.data_dir, args.filter);
    let tally = harness.run(out)?;
    if VERBOSE.load(Ordering::Relaxed) {
        writeln!(out, "\n{}/{} samples passed.", tally.passed, tally.total)?;
    }
    Ok(ExitCode::SUCCESS)
}
