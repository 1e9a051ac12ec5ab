//! Error types for rEMS-Monitor
//!
//! This module defines the error types used throughout the application.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Include 패턴 컴파일 에러
#[derive(Error, Debug)]
pub enum PatternError {
    /// 정규식 패턴 컴파일 실패
    #[error("Invalid include pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// 브로커 admin 인터페이스 에러 타입
#[derive(Error, Debug)]
pub enum AdminError {
    /// HTTP 클라이언트 초기화 실패
    #[error("Failed to initialize HTTP client: {0}")]
    HttpClientInit(#[source] reqwest::Error),

    /// HTTP 요청 실패
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[source] reqwest::Error),

    /// HTTP 응답 읽기 실패
    #[error("Failed to read HTTP response: {0}")]
    HttpResponse(#[source] reqwest::Error),

    /// HTTP 상태 코드 에러
    #[error("HTTP error status: {0}")]
    HttpStatus(u16),

    /// JSON 파싱 에러
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// 잘못된 admin URL
    #[error("Invalid admin URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// TLS 설정 에러 (인증서 파일 등)
    #[error("TLS configuration error: {0}")]
    Tls(String),

    /// 타임아웃
    /// The value is the configured timeout in milliseconds, if known.
    #[error("Request timed out{}", .0.map(|ms| format!(" after {}ms", ms)).unwrap_or_default())]
    Timeout(Option<u64>),

    /// 연결 실패
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// 인증 실패
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// 브로커가 반환한 admin 에러
    #[error("Broker admin error: {0}")]
    Broker(String),
}

impl AdminError {
    /// 재시도 가능한 에러인지 확인
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AdminError::HttpRequest(_)
                | AdminError::HttpResponse(_)
                | AdminError::Timeout(..)
                | AdminError::ConnectionFailed(_)
                | AdminError::HttpStatus(500..=599)
        )
    }

    /// HTTP 상태 코드 추출
    pub fn http_status(&self) -> Option<u16> {
        match self {
            AdminError::HttpStatus(code) => Some(*code),
            _ => None,
        }
    }

    /// Create a Timeout error with known duration
    pub fn timeout_with_duration(ms: u64) -> Self {
        AdminError::Timeout(Some(ms))
    }
}

impl From<reqwest::Error> for AdminError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // reqwest doesn't expose the configured timeout; use
            // AdminError::timeout_with_duration() when the duration is known.
            AdminError::Timeout(None)
        } else if err.is_connect() {
            AdminError::ConnectionFailed(err.to_string())
        } else if err.is_request() {
            AdminError::HttpRequest(err)
        } else {
            AdminError::HttpResponse(err)
        }
    }
}

/// Failure of a whole collection cycle for one broker
///
/// Category-level failures never surface here; they are logged and the
/// category simply contributes no metrics.
#[derive(Error, Debug)]
pub enum CollectError {
    /// The broker could not be reached or refused the server-info probe
    #[error("Broker connection failed: {0}")]
    Connection(#[source] AdminError),
}

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Admin client error
    #[error("Admin error: {0}")]
    Admin(#[from] AdminError),

    /// Collection cycle error
    #[error("Collection error: {0}")]
    Collect(#[from] CollectError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, public_message, log_message) = match self {
            AppError::Config(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error",
                e.to_string(),
            ),
            AppError::Admin(e) => (StatusCode::BAD_GATEWAY, "Upstream error", e.to_string()),
            AppError::Collect(e) => (StatusCode::BAD_GATEWAY, "Collection error", e.to_string()),
            AppError::Internal(e) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error", e),
        };

        tracing::error!(status = %status, error = %log_message, "Request failed");

        (status, public_message).into_response()
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;
