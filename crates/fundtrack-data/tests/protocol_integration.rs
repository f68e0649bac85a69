//! 포스트백 프로토콜 통합 테스트.
//!
//! mockito로 조회 페이지를 흉내 내어 토큰 회전, 재시도 한도,
//! 페이지 계약 위반, 배치 전체 흐름을 검증합니다.

use async_trait::async_trait;
use mockito::{Matcher, Server, ServerGuard};
use tokio::sync::Mutex;

use fundtrack_core::{FetchConfig, FetchKey, FundReport, FundRequest, YearMonth};
use fundtrack_data::sink::{BoxError, ReportSink};
use fundtrack_data::{DataError, FormSession, HoldingsFetcher, HoldingsManager};

const FIELD_VIEWSTATE: &str = "__VIEWSTATE";
const FIELD_EVENT_TARGET: &str = "__EVENTTARGET";
const FIELD_MONTH: &str = "ctl00$ContentPlaceHolder1$ddlQ_YM";
const FIELD_COMPANY: &str = "ctl00$ContentPlaceHolder1$ddlQ_Comid";
const FIELD_QUERY: &str = "ctl00$ContentPlaceHolder1$BtnQuery";

const PAGE_PATH: &str = "/holdings.aspx";

/// 테스트용 설정 (백오프 없음).
fn test_config(server: &ServerGuard) -> FetchConfig {
    FetchConfig {
        endpoint: format!("{}{}", server.url(), PAGE_PATH),
        request_timeout_secs: 5,
        max_attempts: 3,
        retry_backoff_secs: 0,
        max_concurrent_fetches: 2,
    }
}

/// 토큰과 운용사 목록이 포함된 초기 페이지.
fn start_page(viewstate: &str) -> String {
    format!(
        r#"<html><body><form>
            <input type="hidden" name="__VIEWSTATE" value="{viewstate}" />
            <input type="hidden" name="__VIEWSTATEGENERATOR" value="gen" />
            <input type="hidden" name="__EVENTVALIDATION" value="ev" />
            <select name="{FIELD_COMPANY}">
                <option value="">全部</option>
                <option value="A0005">國泰投信</option>
                <option value="A0012">富邦投信</option>
            </select>
        </form></body></html>"#
    )
}

/// 회전된 토큰만 담긴 중간 페이지.
fn tokens_page(viewstate: &str) -> String {
    format!(
        r#"<html><body><form>
            <input type="hidden" name="__VIEWSTATE" value="{viewstate}" />
            <input type="hidden" name="__VIEWSTATEGENERATOR" value="gen" />
            <input type="hidden" name="__EVENTVALIDATION" value="ev" />
        </form></body></html>"#
    )
}

/// 펀드 하나짜리 결과 페이지.
fn result_page(fund: &str, holdings: &[(&str, &str, &str)]) -> String {
    let mut rows = String::from(
        "<tr><th>基金名稱</th><th>名次</th><th>標的種類</th><th>標的代號</th>\
         <th>標的名稱</th><th>金額</th><th>擔保機構</th><th>次順位債券</th>\
         <th>受益權單位數</th><th>基金淨資產價值之比例</th></tr>",
    );

    for (index, (code, name, amount)) in holdings.iter().enumerate() {
        let rank = index + 1;
        if index == 0 {
            rows.push_str(&format!(
                "<tr><td>{fund}</td><td>{rank}</td><td>股票</td><td>{code}</td>\
                 <td>{name}</td><td>{amount}</td><td></td><td></td><td></td><td>1.0</td></tr>"
            ));
        } else {
            rows.push_str(&format!(
                "<tr><td>{rank}</td><td>股票</td><td>{code}</td>\
                 <td>{name}</td><td>{amount}</td><td></td><td></td><td></td><td>1.0</td></tr>"
            ));
        }
    }

    format!("<html><body><table>{rows}</table></body></html>")
}

/// 보고서를 메모리에 모으는 테스트 소비자.
#[derive(Default)]
struct TestSink {
    reports: Mutex<Vec<FundReport>>,
}

#[async_trait]
impl ReportSink for TestSink {
    async fn write_report(&self, report: &FundReport) -> Result<(), BoxError> {
        self.reports.lock().await.push(report.clone());
        Ok(())
    }
}

/// 한 연월에 대한 2단계 포스트백 목을 등록합니다.
async fn mock_postback_sequence(
    server: &mut ServerGuard,
    month_key: &str,
    rotated_viewstate: &str,
    result_body: String,
) -> (mockito::Mock, mockito::Mock) {
    let select_month = server
        .mock("POST", PAGE_PATH)
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded(FIELD_EVENT_TARGET.into(), FIELD_MONTH.into()),
            Matcher::UrlEncoded(FIELD_MONTH.into(), month_key.into()),
            Matcher::UrlEncoded(FIELD_VIEWSTATE.into(), "vs-start".into()),
        ]))
        .with_status(200)
        .with_body(tokens_page(rotated_viewstate))
        .create_async()
        .await;

    let query = server
        .mock("POST", PAGE_PATH)
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded(FIELD_QUERY.into(), "查詢".into()),
            Matcher::UrlEncoded(FIELD_MONTH.into(), month_key.into()),
            Matcher::UrlEncoded(FIELD_COMPANY.into(), "A0005".into()),
            // 조회 단계는 1차 포스트백이 돌려준 회전 토큰을 써야 한다
            Matcher::UrlEncoded(FIELD_VIEWSTATE.into(), rotated_viewstate.into()),
        ]))
        .with_status(200)
        .with_body(result_body)
        .create_async()
        .await;

    (select_month, query)
}

#[tokio::test]
async fn test_batch_end_to_end_with_token_rotation() {
    let mut server = Server::new_async().await;

    let start = server
        .mock("GET", PAGE_PATH)
        .with_status(200)
        .with_body(start_page("vs-start"))
        .expect_at_least(1)
        .create_async()
        .await;

    let current = result_page(
        "甲基金A類型-累積型",
        &[("2330", "台積電", "1,000,000"), ("2317", "鴻海", "500,000")],
    );
    let previous = result_page(
        "甲基金A類型-累積型",
        &[("2330", "台積電", "900,000"), ("2002", "中鋼", "300,000")],
    );

    let (select_current, query_current) =
        mock_postback_sequence(&mut server, "202402", "vs-feb", current).await;
    let (select_previous, query_previous) =
        mock_postback_sequence(&mut server, "202401", "vs-jan", previous).await;

    let manager = HoldingsManager::new(test_config(&server)).unwrap();
    let sink = TestSink::default();

    let funds = vec![
        // 클래스 표기가 달라도 기본명으로 해석되어야 한다
        FundRequest::new("甲基金B類型-月配息(新臺幣)", "國泰投信"),
        // 운용사 해석 실패는 이 펀드만 실패시킨다
        FundRequest::new("乙基金", "不存在的公司"),
    ];
    let recent = YearMonth { year: 2024, month: 2 };
    let prior = YearMonth { year: 2024, month: 1 };

    let summary = manager.run_batch(&funds, recent, prior, &sink).await.unwrap();

    start.assert_async().await;
    select_current.assert_async().await;
    query_current.assert_async().await;
    select_previous.assert_async().await;
    query_previous.assert_async().await;

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed_funds.len(), 1);
    assert!(summary.failed_keys.is_empty());

    let reports = sink.reports.lock().await;
    assert_eq!(reports.len(), 1);

    let report = &reports[0];
    assert_eq!(report.current_rows.len(), 2);
    assert_eq!(report.previous_rows.len(), 2);

    assert_eq!(report.diff.increase.len(), 1);
    assert_eq!(report.diff.increase[0].code, "2330");
    assert_eq!(report.diff.increase[0].delta.to_string(), "100000");

    assert_eq!(report.diff.added.len(), 1);
    assert_eq!(report.diff.added[0].code, "2317");

    assert_eq!(report.diff.removed.len(), 1);
    assert_eq!(report.diff.removed[0].code, "2002");
}

#[tokio::test]
async fn test_missing_tokens_fail_without_retry() {
    let mut server = Server::new_async().await;

    // 토큰이 전혀 없는 페이지: 계약 위반이므로 정확히 1회만 요청해야 한다
    let start = server
        .mock("GET", PAGE_PATH)
        .with_status(200)
        .with_body("<html><body><form></form></body></html>")
        .expect(1)
        .create_async()
        .await;

    let session = FormSession::new(test_config(&server)).unwrap();
    let error = session.load_start().await.unwrap_err();

    start.assert_async().await;
    assert!(matches!(error, DataError::MissingToken { step: "start", .. }));
}

#[tokio::test]
async fn test_server_errors_are_retried_to_the_limit() {
    let mut server = Server::new_async().await;

    // 5xx 는 단계당 최대 시도 횟수(3회)까지 재시도된다
    let start = server
        .mock("GET", PAGE_PATH)
        .with_status(503)
        .expect(3)
        .create_async()
        .await;

    let session = FormSession::new(test_config(&server)).unwrap();
    let error = session.load_start().await.unwrap_err();

    start.assert_async().await;
    assert!(matches!(error, DataError::ServerError { status: 503 }));
}

#[tokio::test]
async fn test_missing_result_table_is_fatal_for_that_fetch() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", PAGE_PATH)
        .with_status(200)
        .with_body(start_page("vs-start"))
        .create_async()
        .await;

    // 1차/2차 포스트백 모두 성공하지만 결과에 보유내역 표가 없다
    server
        .mock("POST", PAGE_PATH)
        .match_body(Matcher::UrlEncoded(
            FIELD_EVENT_TARGET.into(),
            FIELD_MONTH.into(),
        ))
        .with_status(200)
        .with_body(tokens_page("vs-2"))
        .create_async()
        .await;
    server
        .mock("POST", PAGE_PATH)
        .match_body(Matcher::UrlEncoded(FIELD_QUERY.into(), "查詢".into()))
        .with_status(200)
        .with_body("<html><body><p>查無資料</p></body></html>")
        .create_async()
        .await;

    let session = FormSession::new(test_config(&server)).unwrap();
    let fetcher = HoldingsFetcher::new(session);

    let key = FetchKey {
        year_month: "202402".to_string(),
        company_code: "A0005".to_string(),
    };
    let error = fetcher.fetch(&key).await.unwrap_err();

    assert!(matches!(error, DataError::ResultTableMissing { .. }));
}
