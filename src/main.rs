use clap::Parser;
use drive_mirror_lib::config::Args;
use log::{debug, error};

#[tokio::main]
async fn main() {
    // Loaded first so RUST_LOG and every option can come from .env
    let env_file = dotenvy::dotenv().ok();

    if let Err(e) = drive_mirror_lib::init_logging() {
        eprintln!("{}", e);
    }
    if let Some(path) = env_file {
        debug!("Loaded environment from {}", path.display());
    }

    let config = match Args::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };

    // Per-file failures do not change the exit code
    if let Err(e) = drive_mirror_lib::run(config).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
