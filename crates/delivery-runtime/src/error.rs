//! Handler errors.

use sd_01_artifact_store::ArtifactError;
use sd_03_access_tokens::{TokenError, ValidationCode};
use sd_05_finalization::RepositoryError;
use shared_types::{DeliveryId, DeliveryStatus};
use thiserror::Error;

/// Errors returned by the upload and download handlers.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Delivery not found: {id}")]
    DeliveryNotFound { id: DeliveryId },

    #[error("Delivery {id} no longer accepts artifacts ({status})")]
    NotAccepting { id: DeliveryId, status: DeliveryStatus },

    #[error("Unsupported content type: {mime_type}")]
    UnsupportedContentType { mime_type: String },

    #[error("Payload is empty")]
    EmptyPayload,

    #[error("Payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    /// Token did not validate; carries `NOT_FOUND`, `REVOKED` or `EXPIRED`.
    #[error("Access token rejected: {code}")]
    TokenRejected { code: ValidationCode },

    /// A different blob already occupies the artifact's canonical path.
    #[error("Artifact conflict at {artifact}")]
    ArtifactConflict { artifact: String },

    #[error("Final document not available for delivery {id}")]
    DocumentUnavailable { id: DeliveryId },

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl HandlerError {
    /// HTTP status a transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::DeliveryNotFound { .. } | HandlerError::DocumentUnavailable { .. } => 404,
            HandlerError::NotAccepting { .. } | HandlerError::ArtifactConflict { .. } => 409,
            HandlerError::UnsupportedContentType { .. } | HandlerError::EmptyPayload => 400,
            HandlerError::PayloadTooLarge { .. } => 413,
            HandlerError::TokenRejected { code } => match code {
                ValidationCode::NotFound => 404,
                _ => 410,
            },
            HandlerError::Repository(RepositoryError::NotFound { .. }) => 404,
            HandlerError::Repository(RepositoryError::InvalidState { .. }) => 409,
            HandlerError::Artifact(_) | HandlerError::Repository(_) | HandlerError::Token(_) => 500,
        }
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;
