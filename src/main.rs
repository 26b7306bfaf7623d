//! Binary entry point: read the environment, start file logging, open the
//! local store and hand control to the Ratatui event loop.
use aviary::logging::init_logging;
use aviary::{run_app, App, AppContext, Config};

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let _log_guard = init_logging(&config)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting aviary");

    let context = AppContext::from_config(&config)?;
    let mut app = App::new(context);
    let result = run_app(&mut app);

    if let Err(err) = &result {
        tracing::error!(error = %format!("{err:#}"), "aviary exited with an error");
    }
    result
}
