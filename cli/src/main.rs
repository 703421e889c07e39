use std::process;

use clap::Parser;

use downtime_lib::config::Cli;
use downtime_lib::logging::init_logging;
use downtime_lib::{render_error, run};

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.global.log_level, cli.global.log_format);

    match run(&cli) {
        Ok(out) => println!("{out}"),
        Err(e) => {
            eprintln!("{}", render_error(&e, cli.global.json_errors));
            process::exit(1);
        }
    }
}
