//! 펀드명 해석 캐스케이드.
//!
//! 요청 측 표기와 백엔드 표기는 클래스 접미사, 통화 표기, 공시 문구
//! 때문에 자주 어긋납니다. 우선순위가 고정된 순수 매칭 함수들을
//! 차례로 시도하고, 첫 성공을 채택합니다:
//!
//! 1. 원문 정확 일치
//! 2. 정규화 후 정확 일치
//! 3. 기본명 일치 (같은 모펀드의 클래스 통합)
//! 4. 접두 일치 (기본명으로 시작하는 키 중 가장 긴 것)
//! 5. 포함 일치 (정규화 문자열의 양방향 포함)
//!
//! 모든 단계가 실패하면 빈 행 목록을 반환합니다. 한 펀드의 데이터
//! 부재가 배치를 실패시키지 않도록 오류가 아닙니다.

use fundtrack_core::domain::name::{base_name, normalize};
use fundtrack_core::{FundTable, HoldingRow};
use tracing::debug;

/// 요청 펀드명으로 테이블에서 행 목록을 찾습니다.
///
/// 일치하는 키가 없으면 빈 슬라이스를 반환합니다.
pub fn resolve_rows<'a>(table: &'a FundTable, requested: &str) -> &'a [HoldingRow] {
    match resolve_key(table, requested) {
        Some(key) => table.get(key).unwrap_or(&[]),
        None => {
            debug!(fund = requested, "테이블에서 펀드명을 찾지 못했습니다");
            &[]
        }
    }
}

/// 요청 펀드명과 일치하는 테이블 키를 찾습니다.
pub fn resolve_key<'a>(table: &'a FundTable, requested: &str) -> Option<&'a str> {
    match_exact(table, requested)
        .or_else(|| match_normalized(table, requested))
        .or_else(|| match_base_name(table, requested))
        .or_else(|| match_prefix(table, requested))
        .or_else(|| match_substring(table, requested))
}

/// 1단계: 원문 정확 일치.
fn match_exact<'a>(table: &'a FundTable, requested: &str) -> Option<&'a str> {
    table.fund_names().find(|name| *name == requested)
}

/// 2단계: 정규화 후 정확 일치.
fn match_normalized<'a>(table: &'a FundTable, requested: &str) -> Option<&'a str> {
    let target = normalize(requested);

    table.fund_names().find(|name| normalize(name) == target)
}

/// 3단계: 기본명 일치.
///
/// 클래스가 달라도 보유 종목은 동일하므로, 기본명이 같으면 같은
/// 모펀드로 간주합니다.
fn match_base_name<'a>(table: &'a FundTable, requested: &str) -> Option<&'a str> {
    let target = base_name(requested);

    table.fund_names().find(|name| base_name(name) == target)
}

/// 4단계: 접두 일치.
///
/// 요청의 기본명으로 시작하는 정규화 키 중 가장 긴(가장 구체적인)
/// 키를 선택합니다.
fn match_prefix<'a>(table: &'a FundTable, requested: &str) -> Option<&'a str> {
    let target = base_name(requested);

    if target.is_empty() {
        return None;
    }

    table
        .fund_names()
        .filter(|name| normalize(name).starts_with(&target))
        .max_by_key(|name| normalize(name).len())
}

/// 5단계: 포함 일치 (양방향).
fn match_substring<'a>(table: &'a FundTable, requested: &str) -> Option<&'a str> {
    let target = normalize(requested);

    if target.is_empty() {
        return None;
    }

    table.fund_names().find(|name| {
        let normalized = normalize(name);
        normalized.contains(&target) || target.contains(&normalized)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(rank: u32, code: &str) -> HoldingRow {
        HoldingRow {
            rank,
            asset_type: "股票".to_string(),
            code: code.to_string(),
            name: "標的".to_string(),
            amount: "1,000".to_string(),
            collateral_agency: String::new(),
            subordinated_bond: String::new(),
            beneficiary_units: String::new(),
            net_asset_pct: String::new(),
        }
    }

    fn table_with(names: &[&str]) -> FundTable {
        let mut table = FundTable::new();
        for (index, name) in names.iter().enumerate() {
            table.start_fund(*name);
            table.push_row(row(1, &format!("23{index:02}")));
        }
        table
    }

    #[test]
    fn test_exact_match_wins() {
        let table = table_with(&["甲基金", "甲基金A類型"]);
        assert_eq!(resolve_key(&table, "甲基金"), Some("甲基金"));
    }

    #[test]
    fn test_normalized_match() {
        let table = table_with(&["甲基金Ａ類型"]);
        assert_eq!(resolve_key(&table, "甲基金A類型"), Some("甲基金Ａ類型"));
    }

    #[test]
    fn test_base_name_match_across_share_classes() {
        // 요청은 A클래스, 테이블 키는 I클래스 + 통화/공시 표기
        let table =
            table_with(&["乙全球基金I類型-不配息(新臺幣)(本基金之配息來源可能為本金)"]);

        assert_eq!(
            resolve_key(&table, "乙全球基金A類型-不配息"),
            Some("乙全球基金I類型-不配息(新臺幣)(本基金之配息來源可能為本金)")
        );
    }

    #[test]
    fn test_prefix_match_prefers_longest() {
        let mut table = FundTable::new();
        table.start_fund("丙科技基金");
        table.push_row(row(1, "2330"));
        table.start_fund("丙科技基金升級版");
        table.push_row(row(1, "2454"));

        // 두 키 모두 기본명 "丙科技" 로 시작하므로 더 긴 키가 이긴다
        assert_eq!(match_prefix(&table, "丙科技"), Some("丙科技基金升級版"));
    }

    #[test]
    fn test_substring_fallback() {
        let table = table_with(&["丁精選成長基金"]);
        assert_eq!(
            resolve_key(&table, "精選成長"),
            Some("丁精選成長基金")
        );
    }

    #[test]
    fn test_no_match_returns_empty_rows() {
        let table = table_with(&["甲基金"]);
        assert!(resolve_rows(&table, "戊債券基金").is_empty());
    }

    #[test]
    fn test_resolved_rows_are_returned() {
        let table = table_with(&["甲基金"]);
        let rows = resolve_rows(&table, "甲基金");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].code, "2300");
    }
}
