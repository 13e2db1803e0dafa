use std::path::{Path, PathBuf};

use clef_core::gallery::{ArtifactKind, ConversionRecord, GalleryClient};
use clef_core::media::sanitize_file_name;
use serde::Serialize;

use crate::cli::ArtifactFlavor;
use crate::commands::common::{load_context, write_bytes};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct SheetListItem {
    filename: String,
    omr: String,
    mxl: String,
}

fn sheet_to_list_item(record: &ConversionRecord) -> SheetListItem {
    SheetListItem {
        filename: record.file_name.clone(),
        omr: record.artifact_name(ArtifactKind::Omr),
        mxl: record.artifact_name(ArtifactKind::Mxl),
    }
}

pub async fn run_list(global_profile: Option<&str>, as_json: bool) -> Result<(), CliError> {
    let context = load_context(global_profile)?;
    let session = context.require_session().await?;
    let gallery = GalleryClient::new(context.config.clone())?;
    let records = gallery.list(Some(&session)).await?;

    if as_json {
        let json_items = records
            .iter()
            .map(sheet_to_list_item)
            .collect::<Vec<SheetListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if records.is_empty() {
        println!("No conversions yet.");
    } else {
        for record in &records {
            println!("{}", record.file_name);
            println!("  omr: {}", record.artifact_name(ArtifactKind::Omr));
            println!("  mxl: {}", record.artifact_name(ArtifactKind::Mxl));
        }
    }

    Ok(())
}

pub async fn run_show(
    global_profile: Option<&str>,
    name: &str,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let context = load_context(global_profile)?;
    let session = context.require_session().await?;
    let gallery = GalleryClient::new(context.config.clone())?;

    let bytes = gallery.sheet_image(Some(&session), name).await?;
    // The sanitized name doubles as a guard against path-shaped entries.
    let path = output.map_or_else(
        || PathBuf::from(sanitize_file_name(name)),
        Path::to_path_buf,
    );
    write_bytes(&path, &bytes)
}

pub async fn run_fetch(
    global_profile: Option<&str>,
    name: &str,
    flavor: ArtifactFlavor,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let context = load_context(global_profile)?;
    let session = context.require_session().await?;
    let gallery = GalleryClient::new(context.config.clone())?;

    let record = ConversionRecord {
        file_name: name.to_string(),
    };
    let artifact = record.artifact_name(flavor.kind());
    let bytes = gallery
        .conversion_artifact(Some(&session), &artifact)
        .await?;
    let path = output.map_or_else(
        || PathBuf::from(sanitize_file_name(&artifact)),
        Path::to_path_buf,
    );
    write_bytes(&path, &bytes)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn list_items_carry_both_artifact_names() {
        let record = ConversionRecord {
            file_name: "etude.jpg".to_string(),
        };
        let item = sheet_to_list_item(&record);
        assert_eq!(item.filename, "etude.jpg");
        assert_eq!(item.omr, "etude.omr");
        assert_eq!(item.mxl, "etude.mxl");
    }
}
