// Entrypoint for the sign-up CLI.
// - Keeps `main` small: set up logging, create an API client and hand it
//   to the UI loop.
// - Logs go to stderr; set `RUST_LOG=info` to see requests.

use anyhow::Context;
use signup_cli::{api::ApiClient, ui::main_menu};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Configured by `API_BASE_URL` and `UPLOAD_TIMEOUT_SECS`, see `config::Config`.
    let api = ApiClient::from_env().context("Failed to set up the API client")?;
    log::info!("using backend at {}", api.base_url());

    // Blocks until the user exits.
    main_menu(&api)?;
    Ok(())
}
