use std::path::Path;

use clef_core::auth::{AuthClient, Session, SessionResolver, SessionState};
use clef_core::config::ClientConfig;

use crate::error::CliError;
use crate::profiles::CliProfilesConfig;
use crate::token_store::KeyringTokenStore;

/// Everything a command needs to talk to the configured backend.
pub struct CommandContext {
    pub profile_name: String,
    pub config: ClientConfig,
    pub store: KeyringTokenStore,
}

/// Load the profile selected by `--profile`, `CLEF_PROFILE`, or the active
/// profile, and build its client configuration.
pub fn load_context(global_profile: Option<&str>) -> Result<CommandContext, CliError> {
    let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = profiles.resolve_profile_name(global_profile);
    let profile = profiles.profile(&profile_name).cloned().unwrap_or_default();
    let config = profile.client_config().map_err(CliError::Config)?;
    tracing::debug!("Using profile '{}'", profile_name);

    let store = KeyringTokenStore::new(&profile_name);
    Ok(CommandContext {
        profile_name,
        config,
        store,
    })
}

impl CommandContext {
    /// Settle the stored token into a definite session state.
    pub async fn resolve_session(&self) -> Result<SessionState, CliError> {
        let client = AuthClient::new(self.config.clone())?;
        let mut resolver = SessionResolver::new(client, self.store.clone());
        Ok(resolver.resolve().await.clone())
    }

    /// Resolve the stored token and insist on an authenticated session.
    pub async fn require_session(&self) -> Result<Session, CliError> {
        match self.resolve_session().await? {
            SessionState::Authenticated(session) => Ok(session),
            _ => Err(CliError::NotSignedIn),
        }
    }
}

/// Write fetched bytes to disk and print where they landed.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, bytes)?;
    println!("{}", path.display());
    Ok(())
}
