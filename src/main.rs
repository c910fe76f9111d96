use std::process;

fn main() {
    if let Err(e) = tracemark::cli::run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
