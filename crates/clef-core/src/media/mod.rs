//! Media descriptors and the filename/MIME rules shared by every upload path.
//!
//! The extension tables here are the single source of truth for the MIME
//! types sent to the conversion backend; nothing else may guess types.

pub mod recorder;

use crate::util::unix_timestamp_millis_now;

/// What kind of media a descriptor carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Photo,
}

impl MediaKind {
    /// Multipart field name the conversion backend expects for this kind.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Photo => "photo",
        }
    }

    /// Short label used in fallback file names and user messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Photo => "photo",
        }
    }

    /// MIME type assumed when a file name gives nothing to go on.
    #[must_use]
    pub const fn default_mime(self) -> &'static str {
        match self {
            Self::Audio => "audio/*",
            Self::Photo => "image",
        }
    }
}

/// One piece of media ready for submission.
///
/// A descriptor is consumed by value when submitted, so a given capture can
/// only be uploaded once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDescriptor {
    pub kind: MediaKind,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl MediaDescriptor {
    /// Build a descriptor from an optional source file name and raw bytes.
    ///
    /// The name is sanitized, missing or empty names get a time-suffixed
    /// fallback, and the MIME type comes from the extension tables.
    #[must_use]
    pub fn new(kind: MediaKind, source_name: Option<&str>, bytes: Vec<u8>) -> Self {
        let file_name = descriptor_file_name(kind, source_name, None);
        let mime_type = mime_for_file_name(kind, &file_name).to_string();
        Self {
            kind,
            file_name,
            mime_type,
            bytes,
        }
    }

    /// Build a descriptor whose MIME type is already known, e.g. fixed by a
    /// recording encoder. The name is still sanitized.
    #[must_use]
    pub fn with_mime(
        kind: MediaKind,
        source_name: Option<&str>,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Self {
        let file_name = descriptor_file_name(kind, source_name, Some(mime_type));
        Self {
            kind,
            file_name,
            mime_type: mime_type.to_string(),
            bytes,
        }
    }
}

fn descriptor_file_name(
    kind: MediaKind,
    source_name: Option<&str>,
    mime_hint: Option<&str>,
) -> String {
    match source_name.map(sanitize_file_name) {
        Some(name) if !name.is_empty() => name,
        _ => fallback_file_name(kind, mime_hint),
    }
}

/// Replace every character outside `[A-Za-z0-9.-]` with `-`.
///
/// Idempotent: sanitizing an already sanitized name changes nothing.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() || matches!(character, '.' | '-') {
                character
            } else {
                '-'
            }
        })
        .collect()
}

/// Time-suffixed name for media whose source did not provide one.
///
/// The extension is added only when the MIME type maps back to a known one.
#[must_use]
pub fn fallback_file_name(kind: MediaKind, mime_type: Option<&str>) -> String {
    let timestamp = unix_timestamp_millis_now();
    match mime_type.and_then(extension_for_mime) {
        Some(extension) => format!("{}-{timestamp}.{extension}", kind.label()),
        None => format!("{}-{timestamp}", kind.label()),
    }
}

/// MIME type for an audio file extension.
#[must_use]
pub fn audio_mime_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/m4a",
        _ => "audio/*",
    }
}

/// MIME type for an image file extension.
#[must_use]
pub fn image_mime_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "image",
    }
}

/// MIME type for a file name, keyed on its final extension.
#[must_use]
pub fn mime_for_file_name(kind: MediaKind, file_name: &str) -> &'static str {
    file_extension(file_name).map_or_else(
        || kind.default_mime(),
        |extension| match kind {
            MediaKind::Audio => audio_mime_for_extension(extension),
            MediaKind::Photo => image_mime_for_extension(extension),
        },
    )
}

fn file_extension(file_name: &str) -> Option<&str> {
    file_name
        .rsplit_once('.')
        .map(|(_, extension)| extension)
        .filter(|extension| !extension.is_empty())
}

fn extension_for_mime(mime_type: &str) -> Option<&'static str> {
    match mime_type.trim().to_ascii_lowercase().as_str() {
        "audio/mpeg" => Some("mp3"),
        "audio/wav" => Some("wav"),
        "audio/m4a" => Some("m4a"),
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}
