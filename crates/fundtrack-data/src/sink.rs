//! 외부 협력자 인터페이스.
//!
//! 순위 조회와 보고서 저장(스프레드시트 등)은 이 시스템의 범위 밖
//! 협력자입니다. 여기서는 비동기 trait 경계만 정의하고, 구현은
//! 호출 측(수집기 바이너리 등)이 제공합니다.

use async_trait::async_trait;
use fundtrack_core::{FundReport, FundRequest};

/// 협력자 경계에서 사용하는 동적 오류 타입.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 순위 제공자.
///
/// 처리할 펀드 목록을 공급합니다. 목록은 호출 측에서 이미 순위대로
/// 정렬/절단된 상태여야 합니다.
#[async_trait]
pub trait RankingProvider: Send + Sync {
    /// 제공자 이름.
    fn name(&self) -> &str;

    /// 상위 펀드 목록을 조회합니다.
    async fn top_funds(&self, limit: usize) -> Result<Vec<FundRequest>, BoxError>;
}

/// 보고서 소비자.
///
/// 펀드별 (당월, 전월, 비교) 결과를 받아 저장합니다. 행 목록과 비교
/// 그룹의 컬럼 순서는 고정 계약이므로 소비자가 재정렬해서는 안 됩니다.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// 펀드 하나의 보고서를 기록합니다.
    async fn write_report(&self, report: &FundReport) -> Result<(), BoxError>;
}
