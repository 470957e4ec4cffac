// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use clap::Parser;
use cli::{Cli, Commands};
use context::AppContext;
use signatrust_core::ApiError;
use signatrust_core::config::ConsoleConfig;

mod cli;
mod context;
mod logging;
mod router;
mod views;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = run().await {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Cli::parse();
    logging::init(args.verbose)?;

    if let Commands::Version = args.command {
        views::version();
        return Ok(());
    }

    let config = args.apply(ConsoleConfig::from_env()?);
    log::debug!(
        "Using {} ({} console), session at {}",
        config.base_url,
        config.variant,
        config.session_path.display()
    );
    let mut ctx = AppContext::new(config, args.json)?;

    let result = views::dispatch(&mut ctx, args.command).await;
    if let Err(Error::Api(ApiError::Unauthorized)) = &result {
        // The adapter already dropped the stored session.
        ctx.auth.invalidate()?;
        log::warn!("Not logged in. Sign in at {}", ctx.guard.login_url());
    }
    result
}
