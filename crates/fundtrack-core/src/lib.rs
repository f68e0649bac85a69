//! # Fundtrack Core
//!
//! 펀드 보유내역 추적 시스템의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 보유내역 행 및 펀드 테이블 타입
//! - 월간 보유내역 비교 (증가/신규/제외)
//! - 펀드 명칭 정규화 및 기본명 추출
//! - 조회 연월 타입 및 기준월 산출
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
