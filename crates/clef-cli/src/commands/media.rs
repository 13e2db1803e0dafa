use std::path::{Path, PathBuf};

use clef_core::media::recorder::RecordedAudio;
use clef_core::upload::{UploadClient, UploadOutcome};
use clef_core::{MediaDescriptor, MediaKind};

use crate::camera;
use crate::commands::common::{load_context, write_bytes, CommandContext};
use crate::error::CliError;
use crate::picker;

#[cfg(feature = "mic")]
pub async fn capture_recording(device: Option<String>) -> Result<RecordedAudio, CliError> {
    // cpal blocks on the device and stdin, so keep it off the async runtime.
    let recording =
        tokio::task::spawn_blocking(move || crate::recorder::record_until_enter(device.as_deref()))
            .await
            .map_err(std::io::Error::other)??;
    Ok(recording)
}

#[cfg(not(feature = "mic"))]
pub async fn capture_recording(_device: Option<String>) -> Result<RecordedAudio, CliError> {
    Err(clef_core::Error::UnsupportedPlatform(
        "this build does not include microphone capture (enable the `mic` feature)".to_string(),
    )
    .into())
}

pub async fn run_record(
    global_profile: Option<&str>,
    output: Option<&Path>,
    submit: bool,
    device: Option<&str>,
) -> Result<(), CliError> {
    let recording = capture_recording(device.map(ToOwned::to_owned)).await?;
    println!("Recorded {} ms of audio", recording.duration_ms);

    if let Some(path) = output {
        write_bytes(path, &recording.bytes)?;
    } else if !submit {
        write_bytes(&PathBuf::from(&recording.file_name), &recording.bytes)?;
    }

    if submit {
        let context = load_context(global_profile)?;
        submit_descriptor(&context, recording.into_descriptor()).await?;
    }
    Ok(())
}

pub async fn run_upload(
    global_profile: Option<&str>,
    path: Option<&Path>,
    legacy: bool,
) -> Result<(), CliError> {
    let Some(descriptor) =
        picker::acquire_file(MediaKind::Audio, path, "Audio file to submit").await?
    else {
        println!("Cancelled.");
        return Ok(());
    };

    let mut context = load_context(global_profile)?;
    if legacy {
        let config = context.config.clone().with_legacy_upload(true);
        context.config = config;
    }
    submit_descriptor(&context, descriptor).await
}

pub async fn run_scan(
    global_profile: Option<&str>,
    path: Option<&Path>,
    use_camera: bool,
) -> Result<(), CliError> {
    let descriptor = if use_camera {
        camera::capture_photo()?
    } else {
        match picker::acquire_file(MediaKind::Photo, path, "Sheet photo to submit").await? {
            Some(descriptor) => descriptor,
            None => {
                println!("Cancelled.");
                return Ok(());
            }
        }
    };

    let context = load_context(global_profile)?;
    submit_descriptor(&context, descriptor).await
}

async fn submit_descriptor(
    context: &CommandContext,
    descriptor: MediaDescriptor,
) -> Result<(), CliError> {
    let session = context.require_session().await?;
    let uploader = UploadClient::new(context.config.clone())?;
    let label = descriptor.file_name.clone();

    match uploader.submit(descriptor, Some(&session)).await? {
        UploadOutcome::Success { artifact_url } => {
            println!("Uploaded {label}");
            if let Some(url) = artifact_url {
                println!("Artifact: {url}");
            }
            Ok(())
        }
        UploadOutcome::Failure { reason } => Err(CliError::ConversionFailed(reason)),
    }
}
