use clap::Parser;
use rhonet::cli::Cli;

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    rhonet::pipeline::run(&cli)?;
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        // Diagnostics go to stdout with an explicit prefix.
        println!("Error: {e}");
        std::process::exit(1);
    }
}
