use std::process::ExitCode;

fn main() -> ExitCode {
    cellarhand_cli::run()
}
