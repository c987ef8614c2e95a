// src/main.rs

use devloop::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("devloop error: {err:?}");
        std::process::exit(devloop::FAILURE_EXIT_CODE);
    }

    let code = run(args).await;
    std::process::exit(code);
}
