//! 보유내역 배치 매니저.
//!
//! 운용사 해석, 조회 키 산출, 병렬 조회, 조회 결과 캐시, 펀드별
//! 월간 비교를 조정하는 중앙 매니저입니다.
//!
//! ## 실행 순서
//! 1. 펀드별 운용사 표시명을 코드로 해석 (중복 제거, 실패는 기록)
//! 2. 필요한 조회 키 집합을 미리 산출 (운용사 x 두 달, 중복 없음)
//! 3. 키들을 제한된 동시성으로 병렬 조회해 캐시 구성
//!    (키당 한 번만 기록, 실패 키는 빈 테이블로 대체)
//! 4. 펀드별로 두 달치 행을 해석하고 비교 결과를 소비자에 전달
//!
//! 개별 조회/펀드의 실패는 요약에 기록될 뿐 배치를 중단하지 않습니다.

use std::collections::{HashMap, HashSet};

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use fundtrack_core::domain::diff;
use fundtrack_core::{FetchConfig, FetchKey, FundReport, FundRequest, FundTable, YearMonth};

use crate::directory::CompanyDirectory;
use crate::error::Result;
use crate::fetch::HoldingsFetcher;
use crate::resolve;
use crate::session::FormSession;
use crate::sink::ReportSink;

/// 배치 실행 결과 요약.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// 보고서를 만든 펀드 수
    pub processed: usize,
    /// 두 달 모두 보유내역이 비어 있던 펀드 수
    pub empty: usize,
    /// 운용사 해석에 실패한 펀드 (요청, 사유)
    pub failed_funds: Vec<(FundRequest, String)>,
    /// 조회에 실패해 빈 테이블로 대체된 키 (키, 사유)
    pub failed_keys: Vec<(FetchKey, String)>,
    /// 소비자 기록 실패 수
    pub sink_errors: usize,
}

impl BatchSummary {
    /// 실패 없이 끝났는지 확인합니다.
    pub fn is_clean(&self) -> bool {
        self.failed_funds.is_empty() && self.failed_keys.is_empty() && self.sink_errors == 0
    }

    /// 요약을 로그로 남깁니다.
    pub fn log_summary(&self, label: &str) {
        info!(
            processed = self.processed,
            empty = self.empty,
            failed_funds = self.failed_funds.len(),
            failed_keys = self.failed_keys.len(),
            sink_errors = self.sink_errors,
            "{} 완료",
            label
        );

        for (key, reason) in &self.failed_keys {
            warn!(%key, reason = %reason, "조회 실패 키");
        }
        for (request, reason) in &self.failed_funds {
            warn!(
                fund = %request.fund_name,
                company = %request.company_name,
                reason = %reason,
                "처리 실패 펀드"
            );
        }
    }
}

/// 조회와 비교를 조정하는 중앙 매니저.
pub struct HoldingsManager {
    fetcher: HoldingsFetcher,
    directory: CompanyDirectory,
    config: FetchConfig,
}

impl HoldingsManager {
    /// 설정으로 매니저를 생성합니다.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let session = FormSession::new(config.clone())?;

        Ok(Self {
            fetcher: HoldingsFetcher::new(session.clone()),
            directory: CompanyDirectory::new(session),
            config,
        })
    }

    /// 운용사 디렉토리를 반환합니다.
    pub fn directory(&self) -> &CompanyDirectory {
        &self.directory
    }

    /// 펀드 배치 하나를 실행합니다.
    ///
    /// `recent`/`previous` 두 달치 보유내역을 조회해 펀드별 보고서를
    /// `sink`에 전달하고 요약을 반환합니다. 배치는 항상 끝까지
    /// 진행됩니다.
    pub async fn run_batch(
        &self,
        funds: &[FundRequest],
        recent: YearMonth,
        previous: YearMonth,
        sink: &dyn ReportSink,
    ) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();

        // 1. 운용사 해석 (표시명 기준 중복 제거)
        let mut company_codes: HashMap<&str, String> = HashMap::new();
        let mut resolvable: Vec<&FundRequest> = Vec::new();

        for request in funds {
            if company_codes.contains_key(request.company_name.as_str()) {
                resolvable.push(request);
                continue;
            }

            match self.directory.resolve(&request.company_name).await {
                Ok(code) => {
                    company_codes.insert(request.company_name.as_str(), code);
                    resolvable.push(request);
                }
                Err(error) => {
                    summary
                        .failed_funds
                        .push((request.clone(), error.to_string()));
                }
            }
        }

        // 2. 필요한 조회 키 집합 (운용사 x 두 달)
        let months = [recent, previous];
        let mut seen: HashSet<FetchKey> = HashSet::new();
        let mut keys: Vec<FetchKey> = Vec::new();

        for code in company_codes.values() {
            for month in &months {
                let key = FetchKey::new(month, code.clone());
                if seen.insert(key.clone()) {
                    keys.push(key);
                }
            }
        }

        info!(
            funds = funds.len(),
            companies = company_codes.len(),
            keys = keys.len(),
            recent = %recent,
            previous = %previous,
            "보유내역 배치 시작"
        );

        // 3. 병렬 조회 (동시성 제한: buffer_unordered 사용)
        let fetcher = &self.fetcher;
        let results: Vec<(FetchKey, Result<FundTable>)> = stream::iter(keys)
            .map(|key| async move {
                let result = fetcher.fetch(&key).await;
                (key, result)
            })
            .buffer_unordered(self.config.max_concurrent_fetches)
            .collect()
            .await;

        // 4. 캐시 구성 (키당 한 번 기록, 실패 키는 빈 테이블)
        let mut cache: HashMap<FetchKey, FundTable> = HashMap::new();

        for (key, result) in results {
            match result {
                Ok(table) => {
                    debug!(%key, funds = table.len(), "조회 완료");
                    cache.insert(key, table);
                }
                Err(error) => {
                    warn!(%key, %error, "조회 실패, 빈 테이블로 대체합니다");
                    summary.failed_keys.push((key.clone(), error.to_string()));
                    cache.insert(key, FundTable::new());
                }
            }
        }

        // 5. 펀드별 해석 + 비교 + 전달
        let empty_table = FundTable::new();

        for request in resolvable {
            let code = &company_codes[request.company_name.as_str()];

            let current_table = cache
                .get(&FetchKey::new(&recent, code.clone()))
                .unwrap_or(&empty_table);
            let previous_table = cache
                .get(&FetchKey::new(&previous, code.clone()))
                .unwrap_or(&empty_table);

            let current_rows = resolve::resolve_rows(current_table, &request.fund_name).to_vec();
            let previous_rows = resolve::resolve_rows(previous_table, &request.fund_name).to_vec();

            if current_rows.is_empty() && previous_rows.is_empty() {
                debug!(fund = %request.fund_name, "두 달 모두 보유내역 없음");
                summary.empty += 1;
            }

            let report = FundReport {
                request: request.clone(),
                current_month: recent,
                previous_month: previous,
                diff: diff::diff(&current_rows, &previous_rows),
                current_rows,
                previous_rows,
            };

            if let Err(error) = sink.write_report(&report).await {
                warn!(fund = %report.request.fund_name, %error, "보고서 기록 실패");
                summary.sink_errors += 1;
            }

            summary.processed += 1;
        }

        Ok(summary)
    }
}
