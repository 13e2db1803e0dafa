//! Clef CLI - Command-line interface for audio and sheet-music conversion
//!
//! Capture a take or a sheet photo from the terminal and send it off for
//! conversion.

mod camera;
mod cli;
mod commands;
mod error;
mod picker;
mod profiles;
#[cfg(feature = "mic")]
mod recorder;
mod token_store;

use clap::{CommandFactory, Parser};

use crate::cli::{Cli, Commands, SheetsCommands};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clef=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    match cli.command {
        Some(Commands::Login { email, password }) => {
            commands::auth::run_login(profile, email, password).await?;
        }
        Some(Commands::Register { email, password }) => {
            commands::auth::run_register(profile, email, password).await?;
        }
        Some(Commands::Logout) => commands::auth::run_logout(profile)?,
        Some(Commands::Whoami) => commands::auth::run_whoami(profile).await?,
        Some(Commands::Record {
            output,
            submit,
            device,
        }) => {
            commands::media::run_record(profile, output.as_deref(), submit, device.as_deref())
                .await?;
        }
        Some(Commands::Upload { path, legacy }) => {
            commands::media::run_upload(profile, path.as_deref(), legacy).await?;
        }
        Some(Commands::Scan { path, camera }) => {
            commands::media::run_scan(profile, path.as_deref(), camera).await?;
        }
        Some(Commands::Sheets { command, json }) => match command {
            Some(SheetsCommands::Show { name, output }) => {
                commands::gallery::run_show(profile, &name, output.as_deref()).await?;
            }
            Some(SheetsCommands::Fetch { name, kind, output }) => {
                commands::gallery::run_fetch(profile, &name, kind, output.as_deref()).await?;
            }
            None => commands::gallery::run_list(profile, json).await?,
        },
        Some(Commands::Shell) => commands::shell::run_shell(profile).await?,
        Some(Commands::Config { command }) => commands::config::run_config(command, profile)?,
        Some(Commands::Completions { shell, output }) => {
            commands::completions::run_completions(shell, output.as_deref())?;
        }
        None => {
            Cli::command().print_help().map_err(CliError::Io)?;
            println!();
        }
    }

    Ok(())
}
