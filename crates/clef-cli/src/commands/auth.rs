use clef_core::auth::{AuthClient, RegisterOutcome, SessionState, TokenStore};

use crate::commands::common::load_context;
use crate::error::CliError;
use crate::picker;
use crate::profiles::CliProfilesConfig;
use crate::token_store::KeyringTokenStore;

pub async fn run_login(
    global_profile: Option<&str>,
    email: Option<String>,
    password: Option<String>,
) -> Result<(), CliError> {
    let context = load_context(global_profile)?;
    let (email, password) = resolve_credentials(email, password)?;

    let client = AuthClient::new(context.config.clone())?;
    let session = client.sign_in(&email, &password).await?;
    context.store.save_token(&session.token)?;
    println!(
        "Signed in profile '{}' as {}",
        context.profile_name, session.identity
    );
    Ok(())
}

pub async fn run_register(
    global_profile: Option<&str>,
    email: Option<String>,
    password: Option<String>,
) -> Result<(), CliError> {
    let context = load_context(global_profile)?;
    let (email, password) = resolve_credentials(email, password)?;

    let client = AuthClient::new(context.config.clone())?;
    match client.register(&email, &password).await? {
        RegisterOutcome::SignedIn(session) => {
            context.store.save_token(&session.token)?;
            println!(
                "Signed in profile '{}' as {}",
                context.profile_name, session.identity
            );
        }
        RegisterOutcome::Created => {
            println!("Account created. Run `clef login` to sign in.");
        }
    }
    Ok(())
}

/// Signing out only touches the keychain, so it works even when the
/// profile has no server URL.
pub fn run_logout(global_profile: Option<&str>) -> Result<(), CliError> {
    let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = profiles.resolve_profile_name(global_profile);
    KeyringTokenStore::new(&profile_name).clear_token()?;
    println!("Signed out profile '{profile_name}'");
    Ok(())
}

pub async fn run_whoami(global_profile: Option<&str>) -> Result<(), CliError> {
    let context = load_context(global_profile)?;
    match context.resolve_session().await? {
        SessionState::Authenticated(session) => {
            println!(
                "Profile '{}' is signed in as {}",
                context.profile_name, session.identity
            );
        }
        _ => println!("Profile '{}' is not signed in.", context.profile_name),
    }
    Ok(())
}

fn resolve_credentials(
    email: Option<String>,
    password: Option<String>,
) -> Result<(String, String), CliError> {
    let email = match email {
        Some(email) => email,
        None => picker::prompt_line("Email")?.unwrap_or_default(),
    };
    let password = match password {
        Some(password) => password,
        None => picker::prompt_line("Password")?.unwrap_or_default(),
    };
    Ok((email, password))
}
