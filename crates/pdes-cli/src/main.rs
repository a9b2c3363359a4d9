//! # pdes-cli
//!
//! The main entry point for the `pdes` binary. Parses the command line
//! and hands off to the driver; exit codes follow the convention 0 for a
//! normal run, 1 for help or version output, and -1 (255) for usage,
//! configuration, or fatal kernel errors.

use clap::error::ErrorKind;
use clap::Parser;

mod archive;
mod args;
mod builtin;
mod driver;
mod logging;
mod model;

fn main() {
    std::process::exit(real_main());
}

fn real_main() -> i32 {
    let cli = match args::Cli::try_parse() {
        Ok(cli) => cli,
        Err(err)
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) =>
        {
            print!("{err}");
            return 1;
        }
        Err(err) => {
            eprint!("{err}");
            return -1;
        }
    };

    match driver::exec(cli) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {err:#}");
            -1
        }
    }
}
