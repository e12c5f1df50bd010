use std::panic;
use std::process::exit;

mod cli;

const CRASH_NOTICE: &str =
    "todoz stopped unexpectedly. Saved todos are not affected; run again with --verbose for details.";

fn main() {
    match panic::catch_unwind(cli::run) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            eprintln!("Error: {}", e);
            exit(1);
        }
        Err(_) => {
            eprintln!("{}", CRASH_NOTICE);
            exit(2);
        }
    }
}
