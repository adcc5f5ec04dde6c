use std::process::ExitCode;

fn main() -> ExitCode {
    match macro_fusion::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            eprintln!("hint: {}", err.remediation());
            ExitCode::from(err.exit_code())
        }
    }
}
