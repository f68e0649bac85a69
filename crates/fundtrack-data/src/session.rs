//! 상태 유지형 조회 페이지 프로토콜 세션.
//!
//! 보유내역 페이지는 ASP.NET 포스트백 방식이라 단순 GET으로는 결과를
//! 받을 수 없습니다. 서버가 발급한 숨김 상태 토큰을 매 단계 되돌려
//! 보내야 하며, 토큰은 포스트백마다 회전됩니다:
//!
//! ```text
//! START --(GET)--> 토큰1 --(POST 연월)--> 토큰2 --(POST 운용사)--> 결과
//! ```
//!
//! 각 단계는 직전 응답에서 파싱한 토큰만 사용합니다. 오래된 토큰을
//! 재사용하면 다음 제출이 거부됩니다.
//!
//! ## 동시성
//! 커넥션 풀과 쿠키 저장소는 세션 전체에서 공유하지만, 토큰 상태는
//! 조회 단위로 소유됩니다. 동시 조회 간에는 어떤 토큰도 공유하지
//! 않습니다.

use fundtrack_core::{FetchConfig, FetchKey};
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::error::{DataError, Result};

/// ASP.NET 숨김 상태 필드명.
const FIELD_VIEWSTATE: &str = "__VIEWSTATE";
const FIELD_VIEWSTATE_GENERATOR: &str = "__VIEWSTATEGENERATOR";
const FIELD_EVENT_VALIDATION: &str = "__EVENTVALIDATION";
const FIELD_EVENT_TARGET: &str = "__EVENTTARGET";
const FIELD_EVENT_ARGUMENT: &str = "__EVENTARGUMENT";

/// 조회 폼 컨트롤 필드명.
pub(crate) const FIELD_MONTH: &str = "ctl00$ContentPlaceHolder1$ddlQ_YM";
pub(crate) const FIELD_CATEGORY: &str = "ctl00$ContentPlaceHolder1$ddlQ_Type";
pub(crate) const FIELD_COMPANY: &str = "ctl00$ContentPlaceHolder1$ddlQ_Comid";
pub(crate) const FIELD_QUERY: &str = "ctl00$ContentPlaceHolder1$BtnQuery";

/// 분류 컨트롤 기본값. 컨트롤이 비활성이어도 항상 전송합니다.
const DEFAULT_CATEGORY: &str = "A";
/// 조회 버튼 표시값.
const QUERY_LABEL: &str = "查詢";

/// 한 페이지의 숨김 상태 토큰 집합.
#[derive(Debug, Clone)]
pub struct PageTokens {
    view_state: String,
    view_state_generator: String,
    event_validation: String,
}

impl PageTokens {
    /// 페이지 HTML에서 세 토큰을 추출합니다.
    ///
    /// 하나라도 없으면 페이지 계약이 바뀐 것이므로 프로토콜 오류입니다.
    pub fn parse(html: &str, step: &'static str) -> Result<Self> {
        let document = Html::parse_document(html);

        let view_state = hidden_field(&document, FIELD_VIEWSTATE).ok_or(
            DataError::MissingToken {
                step,
                missing: FIELD_VIEWSTATE,
            },
        )?;
        let view_state_generator = hidden_field(&document, FIELD_VIEWSTATE_GENERATOR).ok_or(
            DataError::MissingToken {
                step,
                missing: FIELD_VIEWSTATE_GENERATOR,
            },
        )?;
        let event_validation = hidden_field(&document, FIELD_EVENT_VALIDATION).ok_or(
            DataError::MissingToken {
                step,
                missing: FIELD_EVENT_VALIDATION,
            },
        )?;

        Ok(Self {
            view_state,
            view_state_generator,
            event_validation,
        })
    }
}

/// 초기 GET 결과. 운용사 목록 파싱을 위해 페이지 원문도 보존합니다.
#[derive(Debug)]
pub struct StartPage {
    pub tokens: PageTokens,
    pub html: String,
}

/// 연월 선택 포스트백 결과 (회전된 토큰).
#[derive(Debug)]
pub struct MonthPage {
    pub tokens: PageTokens,
}

/// 두 차례의 포스트백으로 결과 페이지를 얻는 폼 세션.
#[derive(Debug, Clone)]
pub struct FormSession {
    client: reqwest::Client,
    config: FetchConfig,
}

impl FormSession {
    /// 설정으로 세션을 생성합니다.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .cookie_store(true)
            .user_agent(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            )
            .build()?;

        Ok(Self { client, config })
    }

    /// 설정을 반환합니다.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// START 단계: 초기 페이지를 GET 하고 토큰을 추출합니다.
    pub async fn load_start(&self) -> Result<StartPage> {
        let html = self
            .request_with_retry("start", || self.client.get(&self.config.endpoint))
            .await?;
        let tokens = PageTokens::parse(&html, "start")?;

        Ok(StartPage { tokens, html })
    }

    /// 1차 포스트백: 연월을 선택하고 회전된 토큰을 받습니다.
    pub async fn select_month(&self, start: &StartPage, year_month: &str) -> Result<MonthPage> {
        let tokens = &start.tokens;
        let form = [
            (FIELD_EVENT_TARGET, FIELD_MONTH),
            (FIELD_EVENT_ARGUMENT, ""),
            (FIELD_VIEWSTATE, tokens.view_state.as_str()),
            (FIELD_VIEWSTATE_GENERATOR, tokens.view_state_generator.as_str()),
            (FIELD_EVENT_VALIDATION, tokens.event_validation.as_str()),
            (FIELD_MONTH, year_month),
            (FIELD_CATEGORY, DEFAULT_CATEGORY),
        ];

        let html = self
            .request_with_retry("select-month", || {
                self.client.post(&self.config.endpoint).form(&form)
            })
            .await?;
        let tokens = PageTokens::parse(&html, "select-month")?;

        Ok(MonthPage { tokens })
    }

    /// 2차 포스트백: 운용사를 선택하고 조회를 실행합니다.
    ///
    /// 응답 본문이 해당 (연월, 운용사)의 결과 페이지입니다.
    pub async fn query_company(
        &self,
        month_page: &MonthPage,
        year_month: &str,
        company_code: &str,
    ) -> Result<String> {
        let tokens = &month_page.tokens;
        let form = [
            (FIELD_EVENT_TARGET, ""),
            (FIELD_EVENT_ARGUMENT, ""),
            (FIELD_VIEWSTATE, tokens.view_state.as_str()),
            (FIELD_VIEWSTATE_GENERATOR, tokens.view_state_generator.as_str()),
            (FIELD_EVENT_VALIDATION, tokens.event_validation.as_str()),
            (FIELD_MONTH, year_month),
            (FIELD_CATEGORY, DEFAULT_CATEGORY),
            (FIELD_COMPANY, company_code),
            (FIELD_QUERY, QUERY_LABEL),
        ];

        self.request_with_retry("query", || {
            self.client.post(&self.config.endpoint).form(&form)
        })
        .await
    }

    /// 전체 시퀀스를 수행해 한 조회 키의 결과 페이지를 반환합니다.
    pub async fn fetch_result_page(&self, key: &FetchKey) -> Result<String> {
        debug!(%key, "포스트백 시퀀스 시작");

        let start = self.load_start().await?;
        let month_page = self.select_month(&start, &key.year_month).await?;
        self.query_company(&month_page, &key.year_month, &key.company_code)
            .await
    }

    /// 한 프로토콜 단계의 요청을 제한된 횟수만큼 재시도합니다.
    ///
    /// 재시도는 단계 내부에서만 이루어지며 (전송 실패, 5xx),
    /// 상태 머신 단계를 넘나들지 않습니다. 실패한 시도의 응답 상태는
    /// 재사용하지 않습니다.
    async fn request_with_retry<B>(&self, step: &'static str, build: B) -> Result<String>
    where
        B: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let outcome = async {
                let response = build().send().await?;
                let status = response.status();

                if status.is_server_error() {
                    return Err(DataError::ServerError {
                        status: status.as_u16(),
                    });
                }

                let response = response.error_for_status()?;
                Ok(response.text().await?)
            }
            .await;

            match outcome {
                Ok(html) => return Ok(html),
                Err(error) if error.is_retryable() && attempt < self.config.max_attempts => {
                    warn!(step, attempt, %error, "요청 실패, 재시도합니다");
                    tokio::time::sleep(self.config.retry_backoff(attempt)).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

/// 숨김 input 필드 값을 추출합니다.
fn hidden_field(document: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse(&format!("input[name={:?}]", name)).ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("value").map(str::to_string))
}
