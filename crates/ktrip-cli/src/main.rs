use clap::Parser;
use ktrip_cli::{Cli, exit_code, logging, render_error, run};

fn main() {
    // Reset SIGPIPE so `ktrip fetch ... | head` exits quietly
    #[cfg(unix)]
    reset_sigpipe();

    logging::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", render_error(&e));
        std::process::exit(exit_code(&e));
    }
}

#[cfg(unix)]
fn reset_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}
