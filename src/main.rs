use std::process::ExitCode;

fn main() -> ExitCode {
    sc_boxcutter::app::run(std::env::args_os())
}
