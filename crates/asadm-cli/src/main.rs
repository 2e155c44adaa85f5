use asadm::{Cli, run};
use clap::Parser;

fn main() {
    // Wide sheets are often paged or grepped; a closed pipe ends the process
    // instead of surfacing as a write error
    #[cfg(unix)]
    reset_sigpipe();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(unix)]
fn reset_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}
