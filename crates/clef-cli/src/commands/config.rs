use clef_core::config::DEFAULT_TIMEOUT_SECS;

use crate::cli::ConfigCommands;
use crate::error::CliError;
use crate::profiles::{
    is_http_url, normalize_profile_name, normalize_text_option, CliProfilesConfig,
};

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => run_config_show(global_profile),
        ConfigCommands::SetUrl {
            url,
            timeout_secs,
            legacy_upload,
            no_activate,
        } => run_config_set_url(global_profile, &url, timeout_secs, legacy_upload, no_activate),
        ConfigCommands::UseProfile { name } => run_config_use_profile(&name),
    }
}

fn run_config_show(global_profile: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let Some(profile) = config.profile(&profile_name) else {
        println!("Profile '{profile_name}' is not configured.");
        return Ok(());
    };

    println!("Profile '{profile_name}'");
    println!(
        "  server_url: {}",
        profile
            .server_url()
            .unwrap_or_else(|| "(unset)".to_string())
    );
    println!(
        "  timeout_secs: {}",
        profile.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    );
    println!(
        "  legacy_upload: {}",
        profile.legacy_upload.unwrap_or(false)
    );
    Ok(())
}

fn run_config_set_url(
    global_profile: Option<&str>,
    url: &str,
    timeout_secs: Option<u64>,
    legacy_upload: Option<bool>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);

    let url = normalize_text_option(Some(url.to_string()))
        .ok_or_else(|| CliError::Config("server URL must not be empty".to_string()))?;
    if !is_http_url(&url) {
        return Err(CliError::Config(
            "server URL must include http:// or https://".to_string(),
        ));
    }

    let profile = config.profile_mut_or_default(&profile_name);
    profile.server_url = Some(url);
    if let Some(secs) = timeout_secs {
        profile.timeout_secs = Some(secs);
    }
    if let Some(legacy) = legacy_upload {
        profile.legacy_upload = Some(legacy);
    }

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!("Profile '{}' updated at {}", profile_name, path.display());
    Ok(())
}

fn run_config_use_profile(name: &str) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let name = normalize_profile_name(Some(name))
        .ok_or_else(|| CliError::Config("profile name must not be empty".to_string()))?;

    if config.profile(&name).is_none() {
        println!(
            "Profile '{name}' has no configuration yet. Run `clef config set-url <URL> --profile {name}`."
        );
    }
    config.active_profile = Some(name.clone());
    config.save().map_err(CliError::Config)?;
    println!("Active profile is now '{name}'");
    Ok(())
}
