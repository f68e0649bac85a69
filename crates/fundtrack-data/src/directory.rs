//! 운용사 디렉토리.
//!
//! 초기 페이지의 운용사 선택 목록을 한 번만 읽어 표시명 -> 백엔드
//! 코드 매핑을 만듭니다. 목록은 프로세스 수명 동안 불변이며, 모든
//! 조회가 같은 매핑을 재사용합니다.

use scraper::{Html, Selector};
use tokio::sync::OnceCell;
use tracing::info;

use crate::error::{DataError, Result};
use crate::session::{FormSession, FIELD_COMPANY};

/// 운용사 표시명 -> 백엔드 코드 매핑.
///
/// 선택 목록의 문서 순서를 유지합니다. 포함 일치가 여러 건일 때
/// 문서 순서상 첫 항목이 선택되도록 하기 위함입니다.
#[derive(Debug, Clone, Default)]
pub struct CompanyMap {
    entries: Vec<(String, String)>,
}

impl CompanyMap {
    /// 빈 매핑을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 항목을 추가합니다.
    pub fn insert(&mut self, name: impl Into<String>, code: impl Into<String>) {
        self.entries.push((name.into(), code.into()));
    }

    /// 표시명을 코드로 해석합니다.
    ///
    /// 정확 일치를 먼저 시도하고, 없으면 양방향 포함 일치(표시명이
    /// 요청을 포함하거나 요청이 표시명을 포함)로 넘어갑니다.
    pub fn resolve(&self, display_name: &str) -> Option<&str> {
        let cleaned = display_name.trim();

        if let Some((_, code)) = self.entries.iter().find(|(name, _)| name == cleaned) {
            return Some(code);
        }

        self.entries
            .iter()
            .find(|(name, _)| name.contains(cleaned) || cleaned.contains(name.as_str()))
            .map(|(_, code)| code.as_str())
    }

    /// 항목 수.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 매핑이 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 운용사 디렉토리.
///
/// 최초 사용 시점에 한 번만 목록을 가져오는 지연 초기화 캐시입니다.
/// 초기화는 조회 디스패치 전에 끝나므로 이후에는 읽기만 일어납니다.
pub struct CompanyDirectory {
    session: FormSession,
    companies: OnceCell<CompanyMap>,
}

impl CompanyDirectory {
    /// 세션으로 디렉토리를 생성합니다.
    pub fn new(session: FormSession) -> Self {
        Self {
            session,
            companies: OnceCell::new(),
        }
    }

    /// 운용사 매핑을 반환합니다. 최초 호출에서만 네트워크를 탑니다.
    pub async fn load(&self) -> Result<&CompanyMap> {
        self.companies
            .get_or_try_init(|| async {
                let start = self.session.load_start().await?;
                let map = parse_company_options(&start.html);

                if map.is_empty() {
                    return Err(DataError::CompanyListMissing);
                }

                info!(companies = map.len(), "운용사 목록 로드 완료");
                Ok(map)
            })
            .await
    }

    /// 운용사 표시명을 백엔드 코드로 해석합니다.
    ///
    /// 해석 실패는 해당 펀드에만 치명적이며 배치 전체를 중단하지
    /// 않습니다.
    pub async fn resolve(&self, display_name: &str) -> Result<String> {
        let companies = self.load().await?;

        companies
            .resolve(display_name)
            .map(str::to_string)
            .ok_or_else(|| DataError::CompanyNotFound(display_name.trim().to_string()))
    }
}

/// 초기 페이지에서 운용사 선택 목록을 파싱합니다.
fn parse_company_options(html: &str) -> CompanyMap {
    let document = Html::parse_document(html);
    let mut map = CompanyMap::new();

    let Ok(selector) = Selector::parse(&format!("select[name={:?}] option", FIELD_COMPANY)) else {
        return map;
    };

    for option in document.select(&selector) {
        let Some(code) = option.value().attr("value") else {
            continue;
        };
        let name = option.text().collect::<String>().trim().to_string();

        // 빈 값은 자리표시자 옵션
        if code.trim().is_empty() || name.is_empty() {
            continue;
        }

        map.insert(name, code.trim());
    }

    map
}
