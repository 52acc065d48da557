use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::models::{ContentType, DocumentType};

/// Errors produced by the analysis core. Every variant carries structured context
/// so callers can branch on the kind instead of parsing messages.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Unreadable {content_type} document: {reason}")]
    UnreadableDocument {
        content_type: ContentType,
        reason: String,
    },

    #[error("Unsupported format: {content_type}")]
    UnsupportedFormat { content_type: String },

    #[error("Document classified as {document_type}, not a resume: {reason}")]
    ClassificationRejected {
        document_type: DocumentType,
        reason: String,
    },

    #[error("Analysis service unavailable after {attempts} attempt(s): {reason}")]
    AnalysisServiceUnavailable { attempts: u32, reason: String },

    #[error("Analysis task failed: {0}")]
    Internal(String),
}

impl AnalysisError {
    pub fn unreadable(content_type: ContentType, reason: impl Into<String>) -> Self {
        AnalysisError::UnreadableDocument {
            content_type,
            reason: reason.into(),
        }
    }

    pub fn unsupported(content_type: impl Into<String>) -> Self {
        AnalysisError::UnsupportedFormat {
            content_type: content_type.into(),
        }
    }

    /// Stable machine-readable code, shared by logs and the HTTP error body.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::UnreadableDocument { .. } => "UNREADABLE_DOCUMENT",
            AnalysisError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            AnalysisError::ClassificationRejected { .. } => "CLASSIFICATION_REJECTED",
            AnalysisError::AnalysisServiceUnavailable { .. } => "ANALYSIS_SERVICE_UNAVAILABLE",
            AnalysisError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg.clone())
            }
            AppError::Analysis(e) => {
                let status = match e {
                    AnalysisError::UnreadableDocument { .. }
                    | AnalysisError::ClassificationRejected { .. } => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    AnalysisError::UnsupportedFormat { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    AnalysisError::AnalysisServiceUnavailable { .. } => {
                        tracing::error!("Analysis service error: {e}");
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                    AnalysisError::Internal(_) => {
                        tracing::error!("Analysis internal error: {e}");
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.code(), e.to_string())
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let AppError::Analysis(AnalysisError::ClassificationRejected { document_type, .. }) =
            &self
        {
            error["document_type"] = json!(document_type);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_maps_to_415() {
        let response = AppError::from(AnalysisError::unsupported("text/plain")).into_response();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn test_service_unavailable_maps_to_503() {
        let err = AnalysisError::AnalysisServiceUnavailable {
            attempts: 2,
            reason: "timeout".to_string(),
        };
        assert_eq!(err.code(), "ANALYSIS_SERVICE_UNAVAILABLE");
        assert_eq!(
            AppError::from(err).into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_rejection_maps_to_422() {
        let err = AnalysisError::ClassificationRejected {
            document_type: DocumentType::Transcript,
            reason: "no resume headings".to_string(),
        };
        assert_eq!(
            AppError::from(err).into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_unreadable_message_names_format() {
        let err = AnalysisError::unreadable(ContentType::Pdf, "document is empty");
        assert_eq!(err.to_string(), "Unreadable PDF document: document is empty");
    }
}
