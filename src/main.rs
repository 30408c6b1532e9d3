mod cli;
use log::debug;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Env files first so RUST_LOG can come from them
    let env_files = songbrowser::config::load_env_files();
    env_logger::init();
    for path in env_files {
        debug!("Loaded environment from {path:?}");
    }

    cli::run().await
}
