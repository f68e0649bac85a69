//! 설정 관리.
//!
//! 이 모듈은 보유내역 조회 백엔드 관련 설정을 정의합니다.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{CoreError, CoreResult};

/// 보유내역 조회 페이지의 기본 엔드포인트.
pub const DEFAULT_ENDPOINT: &str =
    "https://www.sitca.org.tw/ROC/Industry/IN2002.aspx?PGMID=IN0202";

/// 보유내역 조회 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// 조회 페이지 엔드포인트
    pub endpoint: String,
    /// HTTP 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 프로토콜 단계별 최대 시도 횟수
    pub max_attempts: u32,
    /// 재시도 간 백오프 단위 (초, 시도 횟수에 비례해 증가)
    pub retry_backoff_secs: u64,
    /// 동시 조회 최대 개수
    pub max_concurrent_fetches: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: 30,
            max_attempts: 3,
            retry_backoff_secs: 2,
            max_concurrent_fetches: 3,
        }
    }
}

impl FetchConfig {
    /// 환경변수에서 설정을 로드합니다. 미설정 항목은 기본값을 사용합니다.
    pub fn from_env() -> CoreResult<Self> {
        let defaults = Self::default();

        Ok(Self {
            endpoint: std::env::var("FUNDTRACK_ENDPOINT").unwrap_or(defaults.endpoint),
            request_timeout_secs: parse_env(
                "FUNDTRACK_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
            max_attempts: parse_env("FUNDTRACK_MAX_ATTEMPTS", defaults.max_attempts)?,
            retry_backoff_secs: parse_env(
                "FUNDTRACK_RETRY_BACKOFF_SECS",
                defaults.retry_backoff_secs,
            )?,
            max_concurrent_fetches: parse_env(
                "FUNDTRACK_MAX_FETCHES",
                defaults.max_concurrent_fetches,
            )?,
        })
    }

    /// 요청 타임아웃을 반환합니다.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// n번째 시도 이후 대기할 백오프를 반환합니다 (선형 증가).
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.retry_backoff_secs * u64::from(attempt))
    }
}

/// 환경변수를 파싱하고, 없으면 기본값을 반환합니다.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> CoreResult<T> {
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| CoreError::Config(format!("{} 환경변수 값이 올바르지 않습니다: {}", key, value))),
        Err(_) => Ok(default),
    }
}
