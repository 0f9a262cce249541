//! stomper-server binary.
//!
//! Runs the bootstrap with the frame relay engine and maps startup failures
//! to exit codes: 2 configuration, 3 pre-setup hook, 1 anything else.

use std::process::ExitCode;

use stomper_server::{default_setup, RelayEngine};

#[tokio::main]
async fn main() -> ExitCode {
    match default_setup(RelayEngine::default(), None).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if err.before_logging() {
                eprintln!("stomper-server: {}", err);
            } else {
                tracing::error!(error = %err, "Startup failed");
            }
            ExitCode::from(err.exit_code())
        }
    }
}
