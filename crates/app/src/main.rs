mod cli;
mod dashboard;
mod html;

use clap::Parser;

fn main() {
    if let Err(err) = cli::handle_commands(cli::Cli::parse()) {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}
