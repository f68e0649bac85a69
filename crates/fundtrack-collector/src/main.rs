//! Standalone holdings collector CLI.

use std::path::PathBuf;

use chrono::Local;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fundtrack_collector::report::{FundListProvider, JsonReportSink};
use fundtrack_collector::CollectorConfig;
use fundtrack_core::YearMonth;
use fundtrack_data::{HoldingsManager, RankingProvider};

#[derive(Parser)]
#[command(name = "fundtrack-collector")]
#[command(about = "Fundtrack Holdings Collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 보유내역 배치 실행 (조회 → 월간 비교 → JSON 보고서)
    Run {
        /// 펀드 목록 JSON 파일 ([{"fund_name": "...", "company_name": "..."}, ...])
        #[arg(long)]
        funds: PathBuf,

        /// 보고서 출력 경로
        #[arg(long, default_value = "fund_holdings.json")]
        output: PathBuf,

        /// 최근 조회월 (예: "2024 年 03 月", 생략 시 오늘 기준 자동 산출)
        #[arg(long)]
        recent: Option<String>,

        /// 전월 (예: "2024 年 02 月", 생략 시 오늘 기준 자동 산출)
        #[arg(long)]
        previous: Option<String>,

        /// 처리할 최대 펀드 수 (설정값 대신 사용)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// 오늘 기준 조회 대상월 미리보기
    Months,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "fundtrack_collector={level},fundtrack_data={level},fundtrack_core={level}",
                    level = cli.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Fundtrack Holdings Collector 시작");

    // 설정 로드
    let config = CollectorConfig::from_env()?;
    tracing::debug!(endpoint = %config.fetch.endpoint, "설정 로드 완료");

    match cli.command {
        Commands::Run {
            funds,
            output,
            recent,
            previous,
            limit,
        } => {
            let (recent, previous) = resolve_months(recent, previous)?;
            tracing::info!(%recent, %previous, "조회 대상월");

            // 펀드 목록 로드
            let provider = FundListProvider::new(funds);
            let limit = limit.unwrap_or(config.batch_limit);
            let requests = provider.top_funds(limit).await?;

            if requests.is_empty() {
                tracing::warn!("펀드 목록이 비어 있습니다");
                return Ok(());
            }

            // 배치 실행
            let manager = HoldingsManager::new(config.fetch.clone())?;
            let sink = JsonReportSink::new();
            let summary = manager.run_batch(&requests, recent, previous, &sink).await?;

            // 보고서 저장
            let written = sink.save(&output).await?;
            tracing::info!(
                reports = written,
                output = %output.display(),
                "보고서 저장 완료"
            );

            summary.log_summary("보유내역 배치");
        }
        Commands::Months => {
            let today = Local::now().date_naive();
            let (recent, previous) = YearMonth::targets_for(today)?;

            println!("최근 조회월: {}", recent);
            println!("전월: {}", previous);
        }
    }

    Ok(())
}

/// 명시된 연월 인자 또는 오늘 기준 자동 산출값을 반환합니다.
///
/// 두 인자는 함께 지정하거나 함께 생략해야 합니다.
fn resolve_months(
    recent: Option<String>,
    previous: Option<String>,
) -> Result<(YearMonth, YearMonth), Box<dyn std::error::Error + Send + Sync>> {
    match (recent, previous) {
        (Some(recent), Some(previous)) => Ok((recent.parse()?, previous.parse()?)),
        (None, None) => {
            let today = Local::now().date_naive();
            Ok(YearMonth::targets_for(today)?)
        }
        _ => Err("--recent 와 --previous 는 함께 지정해야 합니다".into()),
    }
}
