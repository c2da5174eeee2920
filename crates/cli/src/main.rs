use std::process::ExitCode;

fn main() -> ExitCode {
    meetline_cli::run()
}
