use std::process::ExitCode;

fn main() -> ExitCode {
    match rolematrix_cli::run() {
        Ok(code) => code,
        Err(error) => {
            eprintln!("rolematrix: {error:#}");
            ExitCode::FAILURE
        }
    }
}
