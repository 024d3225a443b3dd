use barsim::cli::{run, Cli};
use barsim::logging;
use clap::Parser;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    logging::init(&cli.log_level);
    run(cli)
}
