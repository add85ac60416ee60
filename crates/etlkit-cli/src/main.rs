//! etlkit CLI
//!
//! Calendar period arithmetic and JSON record helpers from the shell.

use clap::Parser;

mod args;
mod run;

use args::Cli;

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Logs go to stderr so stdout stays clean for JSON
    run::init_logging(args.log_level)?;

    let stdout = std::io::stdout();
    run::execute(args.command, &mut stdout.lock())
}
