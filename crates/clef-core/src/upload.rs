//! Multipart submission of captured media to the conversion backend.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use crate::api::parse_error_reason;
use crate::auth::Session;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::media::{MediaDescriptor, MediaKind};

const GENERIC_FAILURE: &str = "The server could not convert this file";

/// Result of one submission attempt that reached the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Accepted; the backend may reference the produced artifact.
    Success { artifact_url: Option<String> },
    /// Refused, with the backend's reason when it gave one.
    Failure { reason: String },
}

/// Client for the upload endpoints.
#[derive(Clone)]
pub struct UploadClient {
    config: ClientConfig,
    client: Client,
}

impl UploadClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { config, client })
    }

    /// Submit one descriptor. Without a session this fails before any
    /// network traffic. There is no automatic retry; retrying is a user
    /// gesture on a fresh descriptor.
    pub async fn submit(
        &self,
        descriptor: MediaDescriptor,
        session: Option<&Session>,
    ) -> Result<UploadOutcome> {
        let Some(session) = session else {
            return Err(Error::Unauthenticated);
        };

        let route = self.route(descriptor.kind);
        let field_name = descriptor.kind.field_name();
        tracing::debug!(
            "Submitting {} ({} bytes) to {route}",
            descriptor.file_name,
            descriptor.bytes.len()
        );

        // The photo fallback type "image" is not valid MIME syntax; such
        // parts go out without an explicit part type.
        let mut part = Part::bytes(descriptor.bytes).file_name(descriptor.file_name);
        if descriptor.mime_type.contains('/') {
            part = part.mime_str(&descriptor.mime_type).map_err(|error| {
                Error::InvalidInput(format!(
                    "Invalid MIME type {}: {error}",
                    descriptor.mime_type
                ))
            })?;
        }

        let form = Form::new().part(field_name, part);
        let response = self
            .client
            .post(self.config.endpoint(route))
            .bearer_auth(&session.token)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Ok(UploadOutcome::Failure {
                reason: parse_error_reason(status, &body),
            });
        }

        match serde_json::from_str::<UploadResponse>(&body) {
            Ok(payload) => Ok(interpret_upload_response(payload)),
            Err(error) => {
                tracing::warn!("Malformed upload response: {error}");
                Ok(UploadOutcome::Failure {
                    reason: GENERIC_FAILURE.to_string(),
                })
            }
        }
    }

    /// Route for a media kind, honoring the legacy single-endpoint flag.
    fn route(&self, kind: MediaKind) -> &'static str {
        if self.config.legacy_upload() {
            "/upload"
        } else {
            match kind {
                MediaKind::Audio => "/upload/audio",
                MediaKind::Photo => "/upload/photo",
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    success: Option<bool>,
    midi_file: Option<String>,
    #[serde(rename = "musicXmlUrl")]
    music_xml_url: Option<String>,
    error: Option<String>,
    message: Option<String>,
}

fn interpret_upload_response(payload: UploadResponse) -> UploadOutcome {
    if payload.error.is_some() || payload.success == Some(false) {
        let reason = payload
            .error
            .or(payload.message)
            .filter(|reason| !reason.trim().is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        return UploadOutcome::Failure { reason };
    }

    let artifact_url = payload.midi_file.or(payload.music_xml_url);
    if payload.success == Some(true) || artifact_url.is_some() {
        return UploadOutcome::Success { artifact_url };
    }

    tracing::warn!("Upload response carried no recognizable outcome");
    UploadOutcome::Failure {
        reason: GENERIC_FAILURE.to_string(),
    }
}
