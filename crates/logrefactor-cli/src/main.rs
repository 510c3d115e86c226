use std::io;
use std::process::ExitCode;

use logrefactor::{build_cli, execute, parse_command};
use logrefactor_core::init_tracing;

fn main() -> ExitCode {
    init_tracing();

    let matches = build_cli().get_matches();
    let result = parse_command(&matches).and_then(|command| execute(&command, &mut io::stdout().lock()));

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
