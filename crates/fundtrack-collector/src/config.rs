//! 환경변수 기반 설정 모듈.

use fundtrack_core::FetchConfig;

use crate::error::{CollectorError, Result};

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 보유내역 조회 설정
    pub fetch: FetchConfig,
    /// 처리할 최대 펀드 수
    pub batch_limit: usize,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let fetch =
            FetchConfig::from_env().map_err(|e| CollectorError::Config(e.to_string()))?;
        let batch_limit = parse_env("FUNDTRACK_BATCH_LIMIT", 5)?;

        Ok(Self { fetch, batch_limit })
    }
}

/// 환경변수를 파싱하고, 없으면 기본값을 반환합니다.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(value) => value.parse().map_err(|_| {
            CollectorError::Config(format!("{} 환경변수 값이 올바르지 않습니다: {}", key, value))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        let config = CollectorConfig::from_env().unwrap();
        assert_eq!(config.batch_limit, 5);
        assert_eq!(config.fetch.max_attempts, 3);
    }
}
