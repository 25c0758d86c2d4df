use clap::Parser;
use folioback::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
