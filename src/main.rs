use std::path::PathBuf;

use clap::Parser;
use inventory_db::{start_menu, DEFAULT_STORE};
use log::error;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Optionally, sets the inventory file to use
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let path = cli.file.unwrap_or(DEFAULT_STORE.into());

    if let Err(err) = start_menu(path) {
        error!("terminal failure: {err}");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
