//! jbof binary entry point.

use std::process::ExitCode;

use jbof::ui::output;

fn main() -> ExitCode {
    match jbof::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
