//! 펀드 명칭 정규화 및 기본명 추출.
//!
//! 요청 측 표기와 백엔드 표기 사이의 명칭 차이를 흡수하기 위한
//! 순수 함수들입니다. 모든 함수는 결정적이며 멱등입니다:
//! `normalize(normalize(x)) == normalize(x)`.
//!
//! ## 기본명 (base name)
//! 같은 모펀드의 클래스(누적형/월배당형 등)는 보유 종목이 동일하므로,
//! 통화 표기와 클래스 접미사를 제거한 기본명으로 통합해 조회합니다.
//! 예: `甲基金A類型-累積型` 과 `甲基金B類型-月配息(新臺幣)` 는 모두
//! 기본명 `甲基金` 으로 귀결됩니다.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// 공시 문구 괄호 (예: `(本基金之配息來源可能為本金)`).
///
/// 백엔드 펀드명 뒤에 붙는 고지 문구로, 명칭 비교에서 제외합니다.
static DISCLOSURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[(（][^()（）]*本基金[^()（）]*[)）]").unwrap());

/// 통화 표기 괄호 접미사 (예: `(新臺幣)`, `(美元)`).
static CURRENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[(（](?:新臺幣|新台幣|臺幣|台幣|美元|人民幣|日圓|歐元|澳幣|南非幣)[)）]$")
        .unwrap()
});

/// 클래스 접미사 (배당 방식 또는 클래스 기호).
static SHARE_CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:累積型|配息型|不配息|月配息|季配息|半年配息|年配息|[ABCINRS]類型?)$").unwrap()
});

/// 클래스/통화 접미사 앞에 올 수 있는 구분 문자.
const SEPARATORS: [char; 4] = ['-', '‐', '–', '—'];

/// 펀드명을 정규화합니다.
///
/// 1. 유니코드 호환 정규화 (NFKC, 전각 문자를 반각으로 통일)
/// 2. 공백 문자 제거
/// 3. 공시 문구 괄호 제거
pub fn normalize(name: &str) -> String {
    let flattened: String = name.nfkc().collect();
    let compact: String = flattened.chars().filter(|c| !c.is_whitespace()).collect();
    DISCLOSURE_RE.replace_all(&compact, "").into_owned()
}

/// 정규화한 펀드명에서 통화 표기와 클래스 접미사를 제거해 기본명을
/// 추출합니다.
///
/// 접미사는 겹쳐서 나타날 수 있으므로 (`…A類型-不配息(新臺幣)`)
/// 더 이상 제거할 것이 없을 때까지 반복 적용합니다.
pub fn base_name(name: &str) -> String {
    let mut current = normalize(name);

    loop {
        let mut next = CURRENCY_RE.replace(&current, "").into_owned();
        next = SHARE_CLASS_RE.replace(&next, "").into_owned();
        next = next.trim_end_matches(SEPARATORS).to_string();

        if next == current {
            return current;
        }
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_removes_whitespace_and_fullwidth() {
        assert_eq!(normalize("甲基金　Ａ類型"), "甲基金A類型");
        assert_eq!(normalize(" 甲 基 金 "), "甲基金");
    }

    #[test]
    fn test_normalize_strips_disclosure() {
        assert_eq!(
            normalize("甲基金(本基金之配息來源可能為本金)"),
            "甲基金"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "甲基金Ａ類型-累積型(新臺幣)",
            "乙中小基金(本基金之配息來源可能為本金)",
            "丙 科技 基金",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_base_name_unifies_share_classes() {
        assert_eq!(base_name("甲基金B類型-月配息(新臺幣)"), "甲基金");
        assert_eq!(base_name("甲基金A類型-累積型"), "甲基金");
        assert_eq!(
            base_name("甲基金B類型-月配息(新臺幣)"),
            base_name("甲基金A類型-累積型")
        );
    }

    #[test]
    fn test_base_name_strips_stacked_suffixes() {
        assert_eq!(
            base_name("乙全球基金I類型-不配息(新臺幣)(本基金之配息來源可能為本金)"),
            "乙全球基金"
        );
    }

    #[test]
    fn test_base_name_keeps_plain_names() {
        assert_eq!(base_name("丙高科技基金"), "丙高科技基金");
    }

    #[test]
    fn test_base_name_is_idempotent() {
        let once = base_name("甲基金B類型-月配息(新臺幣)");
        assert_eq!(base_name(&once), once);
    }
}
