use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match medask_lib::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Fatal: {e}");
            eprintln!("Fatal: {e}");
            ExitCode::FAILURE
        }
    }
}
