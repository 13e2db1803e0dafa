//! Interactive prompts and media file selection.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clef_core::{MediaDescriptor, MediaKind};

use crate::error::CliError;

/// Prompt on stdout and read one trimmed line; empty input becomes `None`.
pub fn prompt_line(label: &str) -> Result<Option<String>, CliError> {
    print!("{label}: ");
    io::stdout().flush()?;

    let mut buffer = String::new();
    io::stdin().read_line(&mut buffer)?;
    let value = buffer.trim();
    if value.is_empty() {
        Ok(None)
    } else {
        Ok(Some(value.to_string()))
    }
}

/// Resolve a media file from an explicit path or an interactive prompt.
///
/// Returns `Ok(None)` when no path was given and the prompt was left empty.
pub async fn acquire_file(
    kind: MediaKind,
    path: Option<&Path>,
    label: &str,
) -> Result<Option<MediaDescriptor>, CliError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match prompt_line(label)? {
            Some(answer) => PathBuf::from(answer),
            None => return Ok(None),
        },
    };

    Ok(Some(read_media(kind, &path).await?))
}

/// Load a file from disk and normalize it into a submission descriptor.
pub async fn read_media(kind: MediaKind, path: &Path) -> Result<MediaDescriptor, CliError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(MediaDescriptor::new(
        kind,
        path.file_name().and_then(|name| name.to_str()),
        bytes,
    ))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn read_media_normalizes_name_and_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("my take (1).mp3");
        std::fs::write(&path, b"ID3fake").unwrap();

        let descriptor = read_media(MediaKind::Audio, &path).await.unwrap();
        assert_eq!(descriptor.file_name, "my-take--1-.mp3");
        assert_eq!(descriptor.mime_type, "audio/mpeg");
        assert_eq!(descriptor.bytes, b"ID3fake");
    }

    #[tokio::test]
    async fn read_media_handles_photos() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        std::fs::write(&path, b"\x89PNGfake").unwrap();

        let descriptor = read_media(MediaKind::Photo, &path).await.unwrap();
        assert_eq!(descriptor.kind, MediaKind::Photo);
        assert_eq!(descriptor.mime_type, "image/png");
    }

    #[tokio::test]
    async fn read_media_surfaces_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.wav");

        let result = read_media(MediaKind::Audio, &path).await;
        assert!(matches!(result, Err(CliError::Io(_))));
    }

    #[tokio::test]
    async fn acquire_file_uses_the_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        std::fs::write(&path, b"RIFFfake").unwrap();

        let descriptor = acquire_file(MediaKind::Audio, Some(&path), "Audio file")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(descriptor.file_name, "take.wav");
        assert_eq!(descriptor.mime_type, "audio/wav");
    }
}
