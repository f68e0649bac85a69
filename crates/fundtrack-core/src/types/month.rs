//! 조회 연월 타입 및 기준월 산출.
//!
//! 백엔드는 연월을 `"YYYY 年 MM 月"` 형식으로 표기합니다. 이 모듈은
//! 해당 형식의 엄격한 파싱과 6자리 와이어 키(`"YYYYMM"`) 변환,
//! 그리고 영업일 기준의 조회 대상월 산출을 제공합니다.
//!
//! ## 조회 대상월
//! 백엔드의 보유내역 공시는 한 달 이상 지연됩니다. 당월의 9번째
//! 영업일이 지나기 전에는 공시가 아직 한 달 더 뒤처진 것으로 간주해
//! 기준월을 한 달 앞당깁니다.

use chrono::{Datelike, NaiveDate, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::{CoreError, CoreResult};

/// `"YYYY 年 MM 月"` 형식 (공백 허용, 월은 두 자리).
static MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{4})\s*年\s*(\d{2})\s*月\s*$").unwrap());

/// 기준월 판정에 사용하는 영업일 경계 (9번째 영업일 초과 여부).
const PUBLICATION_BUSINESS_DAYS: u32 = 9;

/// 조회 연월.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct YearMonth {
    /// 연도 (서기)
    pub year: i32,
    /// 월 (1-12)
    pub month: u32,
}

impl YearMonth {
    /// 연월을 생성합니다. 월 범위(1-12)를 검증합니다.
    pub fn new(year: i32, month: u32) -> CoreResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(CoreError::MonthFormat(format!(
                "월은 1-12 범위여야 합니다: {}",
                month
            )));
        }
        Ok(Self { year, month })
    }

    /// 6자리 와이어 키를 반환합니다 (예: `"202403"`).
    pub fn as_key(&self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }

    /// 직전 월을 반환합니다.
    pub fn pred(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// 오늘 날짜로부터 (최근 조회월, 그 전월)을 산출합니다.
    ///
    /// 당월 영업일 수가 경계를 넘었으면 당월을, 아니면 전월을 기준월로
    /// 잡고, 기준월의 직전 두 달을 반환합니다. 당월에 오늘보다 이른
    /// 영업일이 하나도 없으면 에러입니다.
    pub fn targets_for(today: NaiveDate) -> CoreResult<(Self, Self)> {
        let index = business_day_index(today).ok_or_else(|| {
            CoreError::InvalidInput(format!("{} 이전의 당월 영업일이 없습니다", today))
        })?;

        let this_month = Self {
            year: today.year(),
            month: today.month(),
        };
        let anchor = if index > PUBLICATION_BUSINESS_DAYS {
            this_month
        } else {
            this_month.pred()
        };

        let recent = anchor.pred();
        Ok((recent, recent.pred()))
    }
}

impl FromStr for YearMonth {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = MONTH_RE
            .captures(s)
            .ok_or_else(|| CoreError::MonthFormat(format!("연월 형식이 아닙니다: {:?}", s)))?;

        // 정규식이 자릿수를 보장하므로 숫자 파싱은 실패하지 않음
        let year: i32 = captures[1].parse().unwrap();
        let month: u32 = captures[2].parse().unwrap();

        Self::new(year, month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04} 年 {:02} 月", self.year, self.month)
    }
}

/// 당월에서 오늘까지의 영업일(월-금) 수를 반환합니다.
///
/// 오늘이 주말이면 가장 가까운 이전 영업일의 순번을 사용합니다.
/// 오늘 이전 영업일이 없으면 `None`.
fn business_day_index(today: NaiveDate) -> Option<u32> {
    let mut count = 0u32;

    for day in 1..=today.day() {
        let date = NaiveDate::from_ymd_opt(today.year(), today.month(), day)?;
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            count += 1;
        }
    }

    (count > 0).then_some(count)
}
