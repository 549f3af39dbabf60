//! Siftbench binary entry point

fn main() {
    if let Err(e) = siftbench_cli::run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
