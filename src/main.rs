//! Vigil CLI: file integrity monitoring.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "vigil",
    version,
    about = "File integrity monitoring: content baselines, tripwire checks and surgical updates"
)]
struct Cli {
    #[command(flatten)]
    global: vigil::cli::GlobalArgs,

    #[command(subcommand)]
    command: vigil::cli::Commands,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = vigil::logging::init(cli.global.verbose) {
        eprintln!("warning: logging disabled: {}", e);
    }
    if let Err(e) = vigil::cli::dispatch(&cli.global, cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
