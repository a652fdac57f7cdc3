use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(err) = wgpu_city::run() {
        eprintln!("Application error: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
