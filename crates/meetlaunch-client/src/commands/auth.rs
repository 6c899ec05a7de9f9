//! Authentication commands.

use tracing::info;

use meetlaunch_providers::google::ClientFactory;

use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Runs the operator authorization flow and caches the resulting token,
/// replacing whatever was cached before.
pub async fn google(config: &ClientConfig) -> ClientResult<()> {
    let factory = ClientFactory::new(config.google.to_provider_config()?);
    let manager = factory.token_manager()?;

    let token = manager.force_reauthorize().await?;
    info!(
        refreshable = token.refresh_token.is_some(),
        "authorization complete"
    );

    println!();
    println!("Authorized. Token cached at {}", factory.config().token_path.display());
    if token.refresh_token.is_none() {
        println!("No refresh token was issued; you will be asked again once it expires.");
    }

    Ok(())
}
