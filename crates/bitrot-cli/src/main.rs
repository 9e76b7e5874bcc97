use bitrot_core::logging;
use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    // Initialize logging as early as possible; fall back to stderr if the
    // state dir is unwritable.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    match cli::run_from_args() {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("bitrot error: {:#}", err);
            ExitCode::from(cli::EXIT_FAILURE)
        }
    }
}
