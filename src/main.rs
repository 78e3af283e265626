use clap::Parser;

use finboard::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    finboard::logging::init(cli.verbose);
    finboard::cli::run(cli)
}
