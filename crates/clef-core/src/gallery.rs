//! Conversion gallery: listing, lazy authenticated fetches, and the viewer
//! state machine.

use reqwest::Client;
use serde::Deserialize;

use crate::api::{backend_rejected, decode_json, success_body};
use crate::auth::Session;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::util::normalize_text_option;

/// Artifact flavors derived from a conversion's source name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Optical-music-recognition intermediate.
    Omr,
    /// Compressed MusicXML.
    Mxl,
}

impl ArtifactKind {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Omr => "omr",
            Self::Mxl => "mxl",
        }
    }
}

/// One converted sheet, as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRecord {
    pub file_name: String,
}

impl ConversionRecord {
    /// Name of a derived artifact: the final extension is substituted, and
    /// names without one get the artifact extension appended.
    #[must_use]
    pub fn artifact_name(&self, kind: ArtifactKind) -> String {
        with_final_extension(&self.file_name, kind.extension())
    }
}

fn with_final_extension(name: &str, extension: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{stem}.{extension}"),
        _ => format!("{name}.{extension}"),
    }
}

/// Client for the gallery's list and binary routes.
///
/// Binary fetches always send the bearer header, whether or not a given
/// deployment enforces it there.
#[derive(Clone)]
pub struct GalleryClient {
    config: ClientConfig,
    client: Client,
}

impl GalleryClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { config, client })
    }

    /// List converted sheets. Entries without a usable name are skipped.
    pub async fn list(&self, session: Option<&Session>) -> Result<Vec<ConversionRecord>> {
        let Some(session) = session else {
            return Err(Error::Unauthenticated);
        };

        let response = self
            .client
            .get(self.config.endpoint("/sheets"))
            .bearer_auth(&session.token)
            .header("Accept", "application/json")
            .send()
            .await?;
        let body = success_body(response).await?;
        let payload: SheetsResponse = decode_json(&body, "sheet list")?;

        Ok(payload
            .sheets
            .into_iter()
            .filter_map(|entry| normalize_text_option(entry.filename))
            .map(|file_name| ConversionRecord { file_name })
            .collect())
    }

    /// Fetch the photographed sheet image.
    pub async fn sheet_image(&self, session: Option<&Session>, file_name: &str) -> Result<Vec<u8>> {
        self.fetch_binary(session, "/uploads/sheets", file_name)
            .await
    }

    /// Fetch a derived conversion artifact.
    pub async fn conversion_artifact(
        &self,
        session: Option<&Session>,
        file_name: &str,
    ) -> Result<Vec<u8>> {
        self.fetch_binary(session, "/uploads/conversions", file_name)
            .await
    }

    async fn fetch_binary(
        &self,
        session: Option<&Session>,
        route: &str,
        file_name: &str,
    ) -> Result<Vec<u8>> {
        let Some(session) = session else {
            return Err(Error::Unauthenticated);
        };

        let encoded = urlencoding::encode(file_name);
        let response = self
            .client
            .get(self.config.endpoint(&format!("{route}/{encoded}")))
            .bearer_auth(&session.token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(response.bytes().await?.to_vec())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(backend_rejected(status, &body))
        }
    }
}

#[derive(Debug, Deserialize)]
struct SheetsResponse {
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    filename: Option<String>,
}

/// What the full-size viewer is showing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewerState {
    #[default]
    Idle,
    Loading {
        file_name: String,
    },
    Loaded {
        file_name: String,
        bytes: Vec<u8>,
    },
    Errored {
        file_name: String,
        message: String,
    },
}

/// Viewer state machine with a stale-completion guard.
///
/// Every selection gets a generation number; completions carrying an older
/// generation are discarded, so a superseded fetch can finish late without
/// clobbering the current view.
#[derive(Debug, Default)]
pub struct Viewer {
    state: ViewerState,
    generation: u64,
}

impl Viewer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn state(&self) -> &ViewerState {
        &self.state
    }

    /// Begin loading a file, superseding any in-flight load. Returns the
    /// generation token the matching [`finish`](Self::finish) must present.
    pub fn select(&mut self, file_name: &str) -> u64 {
        self.generation += 1;
        self.state = ViewerState::Loading {
            file_name: file_name.to_string(),
        };
        self.generation
    }

    /// Apply a fetch result if it belongs to the latest selection.
    ///
    /// Returns `false` when the completion was stale and ignored.
    pub fn finish(&mut self, generation: u64, result: Result<Vec<u8>>) -> bool {
        if generation != self.generation {
            tracing::debug!("Discarding a stale viewer completion");
            return false;
        }
        let ViewerState::Loading { file_name } = &self.state else {
            return false;
        };

        let file_name = file_name.clone();
        self.state = match result {
            Ok(bytes) => ViewerState::Loaded { file_name, bytes },
            Err(error) => ViewerState::Errored {
                file_name,
                message: error.to_string(),
            },
        };
        true
    }

    /// Leave the full view. An errored view ends here once its message has
    /// been surfaced, never lingering on screen.
    pub fn close(&mut self) {
        self.state = ViewerState::Idle;
    }
}
