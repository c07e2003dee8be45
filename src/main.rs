use std::process::ExitCode;

fn main() -> ExitCode {
    cluster_manager::run()
}
