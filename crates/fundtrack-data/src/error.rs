//! 보유내역 조회 모듈 오류 타입.

use fundtrack_core::CoreError;
use thiserror::Error;

/// 조회 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// HTTP 전송 오류
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// 일시적 서버 오류 (5xx)
    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    /// 페이지 계약 위반: 숨김 상태 토큰 누락
    ///
    /// 페이지 구조가 바뀐 것이므로 재시도하지 않습니다.
    #[error("Protocol error at step {step}: missing hidden field {missing}")]
    MissingToken {
        step: &'static str,
        missing: &'static str,
    },

    /// 결과 페이지에 보유내역 표 없음
    #[error("Result table not found for fetch {key}")]
    ResultTableMissing { key: String },

    /// 초기 페이지에 운용사 선택 목록 없음
    #[error("Company list missing from start page")]
    CompanyListMissing,

    /// 운용사 표시명을 해석할 수 없음
    #[error("Company not found: {0}")]
    CompanyNotFound(String),

    /// 핵심 도메인 오류
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl DataError {
    /// 재시도 가능한 오류인지 확인합니다.
    ///
    /// 전송 계층 실패(타임아웃, 연결 실패)와 5xx만 재시도 대상입니다.
    /// 페이지 계약 위반은 재시도해도 해결되지 않습니다.
    pub fn is_retryable(&self) -> bool {
        match self {
            DataError::Http(error) => error.is_timeout() || error.is_connect(),
            DataError::ServerError { .. } => true,
            _ => false,
        }
    }
}

/// 조회 작업을 위한 Result 타입.
pub type Result<T> = std::result::Result<T, DataError>;
