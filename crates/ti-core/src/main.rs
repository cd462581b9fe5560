//! ti-core: schema-less telemetry ingestion CLI.

use clap::Parser;
use ti_core::cli::{run, Cli};

fn main() {
    let cli = Cli::parse();
    let code = run(cli);
    std::process::exit(code.as_i32());
}
