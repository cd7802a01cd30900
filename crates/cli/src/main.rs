use std::process::ExitCode;

fn main() -> ExitCode {
    rebate_cli::run()
}
