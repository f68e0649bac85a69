//! 보유내역 도메인 타입.
//!
//! 이 모듈은 보유내역 조회 관련 타입을 정의합니다:
//! - `HoldingRow` - 상위 10대 보유내역 표의 한 행 (9컬럼 고정)
//! - `FundTable` - 한 (연월, 운용사) 조회 결과의 펀드별 보유내역
//! - `FetchKey` - 조회 단위를 식별하는 캐시 키
//! - `FundRequest` / `FundReport` - 배치 입출력 타입

use serde::{Deserialize, Serialize};
use std::fmt;

use super::diff::DiffResult;
use crate::types::month::YearMonth;

/// 보유내역 표의 고정 컬럼 헤더.
///
/// 다운스트림 스프레드시트 레이아웃과의 호환을 위해 순서가 계약으로
/// 고정되어 있습니다.
pub const HOLDING_HEADERS: [&str; 9] = [
    "名次",
    "標的種類",
    "標的代號",
    "標的名稱",
    "金額",
    "擔保機構",
    "次順位債券",
    "受益權單位數",
    "基金淨資產價值之比例",
];

/// 한 펀드가 보유할 수 있는 최대 표시 종목 수 (상위 10대).
pub const MAX_ROWS_PER_FUND: usize = 10;

/// 상위 10대 보유내역 표의 한 행.
///
/// 백엔드의 9개 데이터 컬럼과 1:1 대응하며, 파싱 이후 불변입니다.
/// 금액류 필드는 천 단위 쉼표가 포함된 원문 문자열을 그대로 보존합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingRow {
    /// 순위 (1부터 시작)
    pub rank: u32,
    /// 종목 종류 (주식/채권 등)
    pub asset_type: String,
    /// 종목 코드
    pub code: String,
    /// 종목명
    pub name: String,
    /// 금액 (천 단위 쉼표 포함 원문)
    pub amount: String,
    /// 담보 기관
    pub collateral_agency: String,
    /// 후순위 채권
    pub subordinated_bond: String,
    /// 수익권 단위수
    pub beneficiary_units: String,
    /// 펀드 순자산가치 대비 비율
    pub net_asset_pct: String,
}

impl HoldingRow {
    /// 9개 데이터 셀에서 행을 생성합니다.
    ///
    /// 셀 수가 9개가 아니거나 순위 셀이 숫자가 아니면 `None`을 반환합니다.
    pub fn from_cells(cells: &[String]) -> Option<Self> {
        if cells.len() != 9 {
            return None;
        }

        let rank: u32 = cells[0].trim().parse().ok()?;

        Some(Self {
            rank,
            asset_type: cells[1].trim().to_string(),
            code: cells[2].trim().to_string(),
            name: cells[3].trim().to_string(),
            amount: cells[4].trim().to_string(),
            collateral_agency: cells[5].trim().to_string(),
            subordinated_bond: cells[6].trim().to_string(),
            beneficiary_units: cells[7].trim().to_string(),
            net_asset_pct: cells[8].trim().to_string(),
        })
    }
}

/// 한 (연월, 운용사) 조회의 펀드별 보유내역 테이블.
///
/// 키는 백엔드가 표기한 원문 펀드명이며, 삽입 순서(문서 순서)를
/// 유지합니다. 펀드당 행 수는 상위 10대 한도(10행)를 넘지 않습니다.
/// 생성 이후에는 읽기 전용으로 취급합니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FundTable {
    entries: Vec<(String, Vec<HoldingRow>)>,
}

impl FundTable {
    /// 빈 테이블을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 새 펀드 그룹을 시작합니다.
    pub fn start_fund(&mut self, name: impl Into<String>) {
        self.entries.push((name.into(), Vec::new()));
    }

    /// 현재 펀드 그룹에 행을 추가합니다.
    ///
    /// 아직 펀드 그룹이 없거나 상위 10대 한도에 도달한 경우 행을 버리고
    /// `false`를 반환합니다.
    pub fn push_row(&mut self, row: HoldingRow) -> bool {
        match self.entries.last_mut() {
            Some((_, rows)) if rows.len() < MAX_ROWS_PER_FUND => {
                rows.push(row);
                true
            }
            _ => false,
        }
    }

    /// 원문 펀드명으로 행 목록을 조회합니다.
    pub fn get(&self, fund_name: &str) -> Option<&[HoldingRow]> {
        self.entries
            .iter()
            .find(|(name, _)| name == fund_name)
            .map(|(_, rows)| rows.as_slice())
    }

    /// 테이블의 펀드명 목록 (문서 순서).
    pub fn fund_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// (펀드명, 행 목록) 순회.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[HoldingRow])> {
        self.entries
            .iter()
            .map(|(name, rows)| (name.as_str(), rows.as_slice()))
    }

    /// 펀드 수.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 테이블이 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 빈 행 그룹(9셀 미만으로 끝난 그룹)을 제거합니다.
    pub fn discard_empty_funds(&mut self) {
        self.entries.retain(|(_, rows)| !rows.is_empty());
    }
}

/// 한 보유내역 조회를 식별하는 캐시 키.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchKey {
    /// 조회 연월 ("YYYYMM")
    pub year_month: String,
    /// 백엔드 운용사 코드
    pub company_code: String,
}

impl FetchKey {
    /// 연월과 운용사 코드로 키를 생성합니다.
    pub fn new(month: &YearMonth, company_code: impl Into<String>) -> Self {
        Self {
            year_month: month.as_key(),
            company_code: company_code.into(),
        }
    }
}

impl fmt::Display for FetchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.year_month, self.company_code)
    }
}

/// 배치 입력: 조회 대상 펀드 하나.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundRequest {
    /// 요청 측 표기 펀드명
    #[serde(rename = "fund_name")]
    pub fund_name: String,
    /// 요청 측 표기 운용사명
    #[serde(rename = "company_name")]
    pub company_name: String,
}

impl FundRequest {
    pub fn new(fund_name: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self {
            fund_name: fund_name.into(),
            company_name: company_name.into(),
        }
    }
}

/// 배치 출력: 펀드 하나의 (당월, 전월, 비교) 결과.
///
/// 행 목록과 비교 그룹의 컬럼 순서는 다운스트림과의 계약으로 고정입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundReport {
    /// 원본 요청
    pub request: FundRequest,
    /// 당월 (최근 조회 연월)
    pub current_month: YearMonth,
    /// 전월
    pub previous_month: YearMonth,
    /// 당월 보유내역 (순위 순, 최대 10행)
    pub current_rows: Vec<HoldingRow>,
    /// 전월 보유내역 (순위 순, 최대 10행)
    pub previous_rows: Vec<HoldingRow>,
    /// 월간 비교 결과
    pub diff: DiffResult,
}
