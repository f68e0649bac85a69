//! 월간 보유내역 비교.
//!
//! 같은 펀드의 두 달치 상위 10대 보유내역을 종목 코드 기준으로 비교해
//! 세 그룹으로 분류합니다:
//! - **증가 (增加持股)**: 두 달 모두 보유하고 금액이 줄지 않은 종목
//! - **신규 (新增持股)**: 당월에만 있는 종목
//! - **제외 (剔除持股)**: 전월에만 있는 종목
//!
//! 종목명은 표기 변형이 있을 수 있으므로 비교 키는 항상 종목 코드입니다.
//! 금액이 감소한 종목은 어느 그룹에도 넣지 않습니다 (운영 정책).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::holding::HoldingRow;

/// 증가 그룹 라벨.
pub const GROUP_INCREASE: &str = "增加持股";
/// 신규 그룹 라벨.
pub const GROUP_ADDED: &str = "新增持股";
/// 제외 그룹 라벨.
pub const GROUP_REMOVED: &str = "剔除持股";

/// 증가 그룹의 고정 헤더 행.
pub const INCREASE_HEADERS: [&str; 4] = ["標的代號", "標的名稱", "金額", "差額"];
/// 신규/제외 그룹의 고정 헤더 행.
pub const CHANGE_HEADERS: [&str; 3] = ["標的代號", "標的名稱", "金額"];

/// 증가 그룹의 한 행: 당월 금액과 전월 대비 차액.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncreaseRow {
    /// 종목 코드
    pub code: String,
    /// 종목명
    pub name: String,
    /// 당월 금액 (원문 문자열)
    pub amount: String,
    /// 전월 대비 차액 (0 이상)
    pub delta: Decimal,
}

/// 신규/제외 그룹의 한 행.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRow {
    /// 종목 코드
    pub code: String,
    /// 종목명
    pub name: String,
    /// 금액 (신규는 당월, 제외는 전월 금액)
    pub amount: String,
}

impl ChangeRow {
    fn from_holding(row: &HoldingRow) -> Self {
        Self {
            code: row.code.clone(),
            name: row.name.clone(),
            amount: row.amount.clone(),
        }
    }
}

/// 월간 비교 결과.
///
/// 각 그룹의 행 순서는 입력 행 순서(순위 순)를 그대로 따릅니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    /// 증가 보유 (당월 순)
    pub increase: Vec<IncreaseRow>,
    /// 신규 보유 (당월 순)
    pub added: Vec<ChangeRow>,
    /// 제외 보유 (전월 순)
    pub removed: Vec<ChangeRow>,
}

impl DiffResult {
    /// 세 그룹이 모두 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.increase.is_empty() && self.added.is_empty() && self.removed.is_empty()
    }
}

/// 천 단위 쉼표가 포함된 금액 문자열을 Decimal로 파싱합니다.
///
/// `"1,234,567"` -> `1234567`. 파싱할 수 없으면 `None`.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let cleaned = text.trim().replace(',', "");

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse().ok()
}

/// 당월/전월 보유내역을 비교합니다.
///
/// - 두 달 모두 보유한 종목은 전월 금액 <= 당월 금액일 때만 증가 그룹에
///   넣고 차액(당월 - 전월, 0 이상)을 계산합니다. 금액이 감소한 종목은
///   보고하지 않습니다.
/// - 금액을 파싱할 수 없는 쌍은 증가 판정에서 조용히 제외됩니다.
pub fn diff(current: &[HoldingRow], previous: &[HoldingRow]) -> DiffResult {
    // 전월 종목 코드 -> 행 (중복 코드는 첫 행 기준)
    let mut previous_by_code: HashMap<&str, &HoldingRow> = HashMap::new();
    for row in previous {
        previous_by_code.entry(row.code.as_str()).or_insert(row);
    }

    let current_codes: HashSet<&str> = current.iter().map(|row| row.code.as_str()).collect();

    let mut result = DiffResult::default();

    for row in current {
        match previous_by_code.get(row.code.as_str()) {
            Some(prev_row) => {
                let (Some(current_amount), Some(previous_amount)) =
                    (parse_amount(&row.amount), parse_amount(&prev_row.amount))
                else {
                    continue;
                };

                if previous_amount <= current_amount {
                    result.increase.push(IncreaseRow {
                        code: row.code.clone(),
                        name: row.name.clone(),
                        amount: row.amount.clone(),
                        delta: current_amount - previous_amount,
                    });
                }
            }
            None => result.added.push(ChangeRow::from_holding(row)),
        }
    }

    for row in previous {
        if !current_codes.contains(row.code.as_str()) {
            result.removed.push(ChangeRow::from_holding(row));
        }
    }

    result
}
