//! Axum route handlers for the Analysis API.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::analysis::models::{AnalysisResult, ContentType, RawDocument};
use crate::errors::{AnalysisError, AppError};
use crate::roles::CategoryListing;
use crate::state::AppState;

/// Generic MIME types browsers send when they do not know better.
const UNTYPED_MIMES: &[&str] = &["application/octet-stream", "binary/octet-stream"];

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RolesResponse {
    pub categories: Vec<CategoryListing>,
}

/// The `file`, `category`, `role` and optional `require_resume` parts of an analyze request.
#[derive(Debug, Default)]
struct Upload {
    bytes: Option<Bytes>,
    mime: Option<String>,
    file_name: Option<String>,
    category: Option<String>,
    role: Option<String>,
    require_resume: bool,
}

impl Upload {
    /// Declared MIME type first, file extension as a fallback.
    fn content_type(&self) -> Result<ContentType, AnalysisError> {
        match self.mime.as_deref().map(str::trim) {
            Some(mime) if !mime.is_empty() && !UNTYPED_MIMES.contains(&mime) => {
                ContentType::from_mime(mime)
            }
            _ => match self.file_name.as_deref() {
                Some(name) => ContentType::from_filename(name),
                None => Err(AnalysisError::unsupported("unknown")),
            },
        }
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
    }
}

fn parse_flag(raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "0" | "no" => Ok(false),
        "true" | "1" | "yes" => Ok(true),
        other => Err(AppError::Validation(format!(
            "'require_resume' must be true or false, got '{other}'"
        ))),
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("'{field}' is required")))
}

async fn read_upload(multipart: &mut Multipart) -> Result<Upload, AppError> {
    let mut upload = Upload::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                upload.mime = field.content_type().map(str::to_string);
                upload.file_name = field.file_name().map(str::to_string);
                upload.bytes = Some(field.bytes().await.map_err(multipart_error)?);
            }
            "category" => upload.category = Some(field.text().await.map_err(multipart_error)?),
            "role" => upload.role = Some(field.text().await.map_err(multipart_error)?),
            "require_resume" => {
                upload.require_resume = parse_flag(&field.text().await.map_err(multipart_error)?)?
            }
            _ => {}
        }
    }
    Ok(upload)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/roles
///
/// Lists job categories with their roles for the role picker.
pub async fn handle_list_roles(State(state): State<AppState>) -> Json<RolesResponse> {
    Json(RolesResponse {
        categories: state.roles.listing(),
    })
}

/// POST /api/v1/analyze
///
/// Multipart upload with `file` (PDF or DOCX), `category` and `role`.
/// A non-resume returns 200 with `document_type` set and all scores `null`,
/// or 422 `CLASSIFICATION_REJECTED` when `require_resume=true`.
pub async fn handle_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResult>, AppError> {
    let request_id = Uuid::new_v4();
    let mut upload = read_upload(&mut multipart).await?;

    let bytes = upload
        .bytes
        .take()
        .ok_or_else(|| AppError::Validation("'file' is required".to_string()))?;
    let category = required(upload.category.take(), "category")?;
    let role = required(upload.role.take(), "role")?;
    let content_type = upload.content_type()?;

    let profile = state.roles.profile(&category, &role).ok_or_else(|| {
        AppError::NotFound(format!("Role '{role}' in category '{category}' not found"))
    })?;

    info!(
        %request_id,
        %content_type,
        bytes = bytes.len(),
        role = %profile.name,
        analyzer = %state.analyzer.backend(),
        "Analyzing upload"
    );

    let result = state
        .analyzer
        .analyze(RawDocument::new(bytes, content_type), profile)
        .await?;

    if upload.require_resume {
        return Ok(Json(result.ensure_resume()?));
    }
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::models::{DOCX_MIME, PDF_MIME};

    fn upload(mime: Option<&str>, file_name: Option<&str>) -> Upload {
        Upload {
            mime: mime.map(str::to_string),
            file_name: file_name.map(str::to_string),
            ..Upload::default()
        }
    }

    #[test]
    fn test_declared_mime_wins() {
        assert_eq!(
            upload(Some(PDF_MIME), Some("resume.docx")).content_type().unwrap(),
            ContentType::Pdf
        );
    }

    #[test]
    fn test_untyped_mime_falls_back_to_extension() {
        assert_eq!(
            upload(Some("application/octet-stream"), Some("resume.docx"))
                .content_type()
                .unwrap(),
            ContentType::Docx
        );
        assert_eq!(
            upload(None, Some("cv.pdf")).content_type().unwrap(),
            ContentType::Pdf
        );
    }

    #[test]
    fn test_unsupported_types() {
        assert!(matches!(
            upload(Some("text/plain"), Some("resume.pdf")).content_type(),
            Err(AnalysisError::UnsupportedFormat { .. })
        ));
        assert!(upload(None, None).content_type().is_err());
        assert!(upload(Some(DOCX_MIME), None).content_type().is_ok());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(" TRUE ").unwrap());
        assert!(!parse_flag("0").unwrap());
        assert!(!parse_flag("").unwrap());
        assert!(matches!(parse_flag("maybe"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_required_trims_and_rejects_blank() {
        assert_eq!(required(Some(" Data ".into()), "category").unwrap(), "Data");
        assert!(matches!(
            required(Some("  ".into()), "role"),
            Err(AppError::Validation(_))
        ));
        assert!(required(None, "role").is_err());
    }
}
