//! 결과 페이지 파싱 및 보유내역 조회.
//!
//! 결과 페이지에는 해당 (연월, 운용사)의 모든 펀드가 한 표에 이어져
//! 나옵니다. 펀드명 셀이 붙은 행(10셀 이상)이 새 펀드 그룹을 열고,
//! 데이터 셀만 있는 행(정확히 9셀)은 현재 그룹에 속합니다.

use fundtrack_core::{FetchKey, FundTable, HoldingRow};
use scraper::{Html, Selector};
use tracing::debug;

use crate::error::{DataError, Result};
use crate::session::FormSession;

/// 보유내역 표 식별에 사용하는 컬럼 라벨.
const LABEL_FUND_NAME: &str = "基金名稱";
const LABEL_ASSET_TYPE: &str = "標的種類";
const LABEL_RANK: &str = "名次";

/// 한 조회 키의 보유내역 테이블을 가져오는 페처.
pub struct HoldingsFetcher {
    session: FormSession,
}

impl HoldingsFetcher {
    /// 세션으로 페처를 생성합니다.
    pub fn new(session: FormSession) -> Self {
        Self { session }
    }

    /// 조회 키 하나에 대해 프로토콜을 수행하고 테이블을 파싱합니다.
    ///
    /// 결과 페이지에 보유내역 표가 없으면 해당 조회만 실패합니다
    /// (페이지 계약 위반, 재시도 없음).
    pub async fn fetch(&self, key: &FetchKey) -> Result<FundTable> {
        let html = self.session.fetch_result_page(key).await?;

        let table = parse_result_page(&html).ok_or_else(|| DataError::ResultTableMissing {
            key: key.to_string(),
        })?;

        debug!(%key, funds = table.len(), "결과 페이지 파싱 완료");
        Ok(table)
    }
}

/// 결과 페이지에서 펀드별 보유내역 테이블을 파싱합니다.
///
/// 세 컬럼 라벨을 모두 포함하는 표가 없으면 `None`.
pub fn parse_result_page(html: &str) -> Option<FundTable> {
    let document = Html::parse_document(html);

    let table_selector = Selector::parse("table").ok()?;
    let tr_selector = Selector::parse("tr").ok()?;
    let td_selector = Selector::parse("td").ok()?;

    let table = document.select(&table_selector).find(|table| {
        let text: String = table.text().collect();
        text.contains(LABEL_FUND_NAME)
            && text.contains(LABEL_ASSET_TYPE)
            && text.contains(LABEL_RANK)
    })?;

    let mut result = FundTable::new();

    for row in table.select(&tr_selector) {
        let cells: Vec<String> = row
            .select(&td_selector)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect();

        if cells.len() >= 10 {
            // 펀드명 셀 + 데이터 9셀: 새 펀드 그룹 시작
            result.start_fund(cells[0].clone());
            if let Some(holding) = HoldingRow::from_cells(&cells[1..10]) {
                result.push_row(holding);
            }
        } else if cells.len() == 9 {
            // 데이터 셀만: 현재 그룹의 다음 순위 행
            if let Some(holding) = HoldingRow::from_cells(&cells) {
                result.push_row(holding);
            }
        }
        // 그 외 행(헤더, 안내문 등)은 무시
    }

    result.discard_empty_funds();
    Some(result)
}
