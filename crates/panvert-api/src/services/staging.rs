//! Streaming multipart stager
//!
//! Writes uploaded files straight to the staging directory chunk by chunk,
//! enforcing size limits as bytes arrive. Every file is registered with a
//! [`StagedFiles`] guard the moment it is created, so any rejection (or the
//! request future being dropped) removes what was already written.

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use panvert_core::AppError;
use panvert_storage::{StagedFiles, StagingArea};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::store_error;
use crate::utils::upload::{sanitize_display_name, sanitize_extension};

/// Longest accepted text field value.
pub const MAX_TEXT_FIELD_BYTES: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSlot {
    Main,
    Template,
}

/// The one place multipart field names are mapped to file slots.
pub fn file_slot(field_name: &str) -> Option<FileSlot> {
    match field_name {
        "file" | "files[0]" => Some(FileSlot::Main),
        "template" => Some(FileSlot::Template),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_file_bytes: u64,
    pub max_total_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct StagedFile {
    /// On-disk name relative to the staging directory
    pub name: String,
    pub path: PathBuf,
    /// Sanitized client filename, display only
    pub original_name: String,
    pub size: u64,
}

/// Everything read from one multipart body.
///
/// Dropping this value deletes every staged file that was not released to a
/// new owner.
#[derive(Debug)]
pub struct StagedUpload {
    pub main: Option<StagedFile>,
    pub template: Option<StagedFile>,
    pub fields: HashMap<String, String>,
    pub files: StagedFiles,
}

impl StagedUpload {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

fn multipart_error(err: MultipartError, limits: UploadLimits) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::FileTooLarge {
            max_bytes: limits.max_total_bytes,
        }
    } else {
        AppError::BadRequest(format!("Malformed multipart body: {}", err.body_text()))
    }
}

/// Stream a multipart body into the staging area.
///
/// The main file is stored as `<main_stem>.<ext>`; a template gets a fresh
/// random name. Only the first file per slot is kept and only the first
/// value of each text field.
#[tracing::instrument(skip_all, fields(upload.stem = %main_stem))]
pub async fn stage_multipart(
    staging: &StagingArea,
    mut multipart: Multipart,
    main_stem: &str,
    limits: UploadLimits,
) -> Result<StagedUpload, AppError> {
    let mut upload = StagedUpload {
        main: None,
        template: None,
        fields: HashMap::new(),
        files: StagedFiles::new(),
    };
    let mut total_bytes: u64 = 0;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limits))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        // A part without a filename is a text value, whatever its name.
        let slot = field
            .file_name()
            .is_some()
            .then(|| file_slot(&field_name))
            .flatten();

        match slot {
            Some(slot) => {
                let taken = match slot {
                    FileSlot::Main => upload.main.is_some(),
                    FileSlot::Template => upload.template.is_some(),
                };
                if taken {
                    tracing::debug!(field = %field_name, "Skipping additional file for slot");
                    continue;
                }

                let stem = match slot {
                    FileSlot::Main => Some(main_stem),
                    FileSlot::Template => None,
                };
                let staged = write_file(
                    staging,
                    field,
                    stem,
                    limits,
                    &mut total_bytes,
                    &mut upload.files,
                )
                .await?;

                tracing::debug!(
                    slot = ?slot,
                    staged_name = %staged.name,
                    size = staged.size,
                    "Staged uploaded file"
                );
                match slot {
                    FileSlot::Main => upload.main = Some(staged),
                    FileSlot::Template => upload.template = Some(staged),
                }
            }
            None if field.file_name().is_some() => {
                tracing::debug!(field = %field_name, "Ignoring unexpected file field");
            }
            None => {
                let value = read_text(field, &field_name, limits).await?;
                upload.fields.entry(field_name).or_insert(value);
            }
        }
    }

    Ok(upload)
}

async fn write_file(
    staging: &StagingArea,
    mut field: Field<'_>,
    stem: Option<&str>,
    limits: UploadLimits,
    total_bytes: &mut u64,
    files: &mut StagedFiles,
) -> Result<StagedFile, AppError> {
    let original_name = sanitize_display_name(field.file_name().unwrap_or_default());
    let extension = sanitize_extension(&original_name);
    let name = match stem {
        Some(stem) => StagingArea::name_for(stem, extension.as_deref()),
        None => StagingArea::fresh_name(extension.as_deref()),
    };
    let path = staging.path_of(&name).map_err(store_error)?;

    let mut file = File::create(&path).await?;
    files.track(&path);

    let mut size: u64 = 0;
    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limits))? {
        size += chunk.len() as u64;
        *total_bytes += chunk.len() as u64;
        if size > limits.max_file_bytes {
            return Err(AppError::FileTooLarge {
                max_bytes: limits.max_file_bytes,
            });
        }
        if *total_bytes > limits.max_total_bytes {
            return Err(AppError::FileTooLarge {
                max_bytes: limits.max_total_bytes,
            });
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(StagedFile {
        name,
        path,
        original_name,
        size,
    })
}

async fn read_text(
    mut field: Field<'_>,
    field_name: &str,
    limits: UploadLimits,
) -> Result<String, AppError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limits))? {
        if buf.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            return Err(AppError::Validation(format!(
                "Field '{}' exceeds {} bytes",
                field_name, MAX_TEXT_FIELD_BYTES
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8(buf)
        .map_err(|_| AppError::BadRequest(format!("Field '{}' is not valid UTF-8", field_name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_slot_aliases() {
        assert_eq!(file_slot("file"), Some(FileSlot::Main));
        assert_eq!(file_slot("files[0]"), Some(FileSlot::Main));
        assert_eq!(file_slot("template"), Some(FileSlot::Template));
        assert_eq!(file_slot("files[1]"), None);
        assert_eq!(file_slot("format"), None);
    }
}
