use std::process::ExitCode;

use tether::engine::{SyncError, EXIT_ABORT};
use tether::ui::output;

fn main() -> ExitCode {
    let code = match tether::cli::run() {
        Ok(code) => code,
        Err(err) => {
            output::error(format!("{:#}", err));
            err.downcast_ref::<SyncError>()
                .map_or(EXIT_ABORT, SyncError::exit_code)
        }
    };
    ExitCode::from(u8::try_from(code).unwrap_or(u8::MAX))
}
