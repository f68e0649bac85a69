//! JSON 파일 기반 협력자 구현.
//!
//! 운영용 스프레드시트 협력자가 연결되기 전까지의 기본 구현입니다.
//! 펀드 목록은 JSON 배열에서 읽고, 보고서는 JSON 문서 하나로
//! 저장합니다. 행/컬럼 순서는 도메인 계약 그대로 직렬화됩니다.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use fundtrack_core::domain::diff::{CHANGE_HEADERS, INCREASE_HEADERS};
use fundtrack_core::{FundReport, FundRequest, HOLDING_HEADERS};
use fundtrack_data::sink::{BoxError, RankingProvider, ReportSink};

/// JSON 파일에서 펀드 목록을 읽는 순위 제공자.
///
/// 파일 형식: `[{"fund_name": "...", "company_name": "..."}, ...]`
/// (순위 협력자가 이미 정렬해 둔 순서를 그대로 사용)
pub struct FundListProvider {
    path: PathBuf,
}

impl FundListProvider {
    /// 펀드 목록 파일 경로로 제공자를 생성합니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RankingProvider for FundListProvider {
    fn name(&self) -> &str {
        "fund-list"
    }

    async fn top_funds(&self, limit: usize) -> Result<Vec<FundRequest>, BoxError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let mut funds: Vec<FundRequest> = serde_json::from_str(&raw)?;

        funds.truncate(limit);
        debug!(funds = funds.len(), path = %self.path.display(), "펀드 목록 로드");

        Ok(funds)
    }
}

/// 저장되는 JSON 문서의 최상위 구조.
#[derive(Serialize)]
struct ReportDocument<'a> {
    /// 보유내역 행의 고정 컬럼 헤더
    holding_headers: [&'static str; 9],
    /// 증가 그룹 헤더
    increase_headers: [&'static str; 4],
    /// 신규/제외 그룹 헤더
    change_headers: [&'static str; 3],
    /// 펀드별 보고서 (배치 순서)
    reports: &'a [FundReport],
}

/// 보고서를 모아 JSON 문서 하나로 저장하는 소비자.
#[derive(Default)]
pub struct JsonReportSink {
    reports: Mutex<Vec<FundReport>>,
}

impl JsonReportSink {
    /// 빈 소비자를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 지금까지 모은 보고서를 파일로 저장하고 개수를 반환합니다.
    pub async fn save(&self, path: &Path) -> Result<usize, BoxError> {
        let reports = self.reports.lock().await;

        let document = ReportDocument {
            holding_headers: HOLDING_HEADERS,
            increase_headers: INCREASE_HEADERS,
            change_headers: CHANGE_HEADERS,
            reports: &reports,
        };

        let json = serde_json::to_string_pretty(&document)?;
        tokio::fs::write(path, json).await?;

        Ok(reports.len())
    }
}

#[async_trait]
impl ReportSink for JsonReportSink {
    async fn write_report(&self, report: &FundReport) -> Result<(), BoxError> {
        self.reports.lock().await.push(report.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundtrack_core::domain::diff::DiffResult;
    use fundtrack_core::YearMonth;

    fn sample_report() -> FundReport {
        FundReport {
            request: FundRequest::new("甲基金", "國泰投信"),
            current_month: YearMonth { year: 2024, month: 2 },
            previous_month: YearMonth { year: 2024, month: 1 },
            current_rows: Vec::new(),
            previous_rows: Vec::new(),
            diff: DiffResult::default(),
        }
    }

    #[tokio::test]
    async fn test_sink_collects_and_saves() {
        let sink = JsonReportSink::new();
        sink.write_report(&sample_report()).await.unwrap();

        let dir = std::env::temp_dir();
        let path = dir.join("fundtrack_report_test.json");
        let written = sink.save(&path).await.unwrap();

        assert_eq!(written, 1);
        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(raw.contains("holding_headers"));
        assert!(raw.contains("甲基金"));

        tokio::fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn test_provider_truncates_to_limit() {
        let dir = std::env::temp_dir();
        let path = dir.join("fundtrack_funds_test.json");
        let funds = vec![
            FundRequest::new("甲基金", "國泰投信"),
            FundRequest::new("乙基金", "富邦投信"),
            FundRequest::new("丙基金", "統一投信"),
        ];
        tokio::fs::write(&path, serde_json::to_string(&funds).unwrap())
            .await
            .unwrap();

        let provider = FundListProvider::new(&path);
        let loaded = provider.top_funds(2).await.unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].fund_name, "甲基金");

        tokio::fs::remove_file(&path).await.ok();
    }
}
