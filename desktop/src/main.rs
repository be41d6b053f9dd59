use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match ks_desktop::app::run().await {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("knowledge-studio: {e}");
            ExitCode::FAILURE
        }
    }
}
