use std::process::ExitCode;

fn main() -> ExitCode {
    vendaflow_cli::run()
}
