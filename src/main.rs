//! shipkit - cross-platform Electron application packager.
//!
//! Turns one source project into distributable bundles for every requested
//! (platform, architecture) combination.

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match shipkit::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    };

    process::exit(exit_code);
}
