use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but does not own the attempt. Carries no detail.
    #[error("Access denied")]
    AccessDenied,

    #[error("Mode mismatch: {0}")]
    ModeMismatch(String),

    #[error("Attempt already completed: {0}")]
    AlreadyCompleted(String),

    #[error("Section mismatch: {0}")]
    SectionMismatch(String),

    #[error("Section not started: {0}")]
    SectionNotStarted(String),

    #[error("Section expired: {0}")]
    SectionExpired(String),

    #[error("Insufficient content: {0}")]
    InsufficientContent(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::AlreadyExists(_) => "ALREADY_EXISTS",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::AccessDenied => "ACCESS_DENIED",
            AppError::ModeMismatch(_) => "MODE_MISMATCH",
            AppError::AlreadyCompleted(_) => "ALREADY_COMPLETED",
            AppError::SectionMismatch(_) => "SECTION_MISMATCH",
            AppError::SectionNotStarted(_) => "SECTION_NOT_STARTED",
            AppError::SectionExpired(_) => "SECTION_EXPIRED",
            AppError::InsufficientContent(_) => "INSUFFICIENT_CONTENT",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Recoverable errors tell the client to refetch state and retry against
    /// the current section.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::SectionMismatch(_)
                | AppError::SectionNotStarted(_)
                | AppError::SectionExpired(_)
        )
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    pub kind: &'static str,
    /// True when refetching the attempt and retrying can succeed.
    pub recoverable: bool,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::AccessDenied => StatusCode::FORBIDDEN,
            AppError::ModeMismatch(_) => StatusCode::BAD_REQUEST,
            AppError::AlreadyCompleted(_) => StatusCode::CONFLICT,
            AppError::SectionMismatch(_) => StatusCode::CONFLICT,
            AppError::SectionNotStarted(_) => StatusCode::CONFLICT,
            AppError::SectionExpired(_) => StatusCode::CONFLICT,
            AppError::InsufficientContent(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            code: self.status_code().as_u16(),
            kind: self.error_code(),
            recoverable: self.is_recoverable(),
        })
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}
impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        AppError::InternalError(format!("BSON serialization error: {}", err))
    }
}
impl From<mongodb::bson::de::Error> for AppError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        AppError::InternalError(format!("BSON deserialization error: {}", err))
    }
}
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::NotFound("test".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::AccessDenied.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::SectionExpired("test".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InsufficientContent("test".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::ModeMismatch("test".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_error_messages() {
        let err = AppError::NotFound("attempt".into());
        assert_eq!(err.to_string(), "Not found: attempt");
        assert_eq!(AppError::AccessDenied.to_string(), "Access denied");
    }

    #[test]
    fn test_timing_errors_are_recoverable() {
        assert!(AppError::SectionMismatch("stale".into()).is_recoverable());
        assert!(AppError::SectionExpired("late".into()).is_recoverable());
        assert!(!AppError::AlreadyCompleted("done".into()).is_recoverable());
        assert!(!AppError::AccessDenied.is_recoverable());
    }

    #[test]
    fn test_error_codes_are_distinct_per_kind() {
        assert_eq!(
            AppError::SectionNotStarted("x".into()).error_code(),
            "SECTION_NOT_STARTED"
        );
        assert_eq!(
            AppError::InsufficientContent("x".into()).error_code(),
            "INSUFFICIENT_CONTENT"
        );
    }

    #[actix_web::test]
    async fn test_error_body_flags_recoverable_kinds() {
        let expired = AppError::SectionExpired("late".into()).error_response();
        let bytes = actix_web::body::to_bytes(expired.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["kind"], "SECTION_EXPIRED");
        assert_eq!(body["code"], 409);
        assert_eq!(body["recoverable"], true);

        let done = AppError::AlreadyCompleted("done".into()).error_response();
        let bytes = actix_web::body::to_bytes(done.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["recoverable"], false);
    }
}
