use crate::domain::model::PaperRecord;
use crate::utils::error::{DigestError, Result};
use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 符合條件的論文不足 `min_results` 時的處理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallPolicy {
    /// 回傳 InsufficientResults 錯誤
    #[default]
    Fail,
    /// 有多少回傳多少，可能是空的
    Accept,
}

impl FromStr for ShortfallPolicy {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "accept" => Ok(Self::Accept),
            other => Err(DigestError::InvalidConfigValueError {
                field: "on_shortfall".to_string(),
                value: other.to_string(),
                reason: "Expected 'fail' or 'accept'".to_string(),
            }),
        }
    }
}

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// 使用主機時鐘的本地日期
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// 收錄區間 `[today - days_back, today]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyWindow {
    pub start: NaiveDate,
    pub today: NaiveDate,
}

impl RecencyWindow {
    pub fn ending(today: NaiveDate, days_back: u32) -> Self {
        let start = today
            .checked_sub_days(Days::new(u64::from(days_back)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, today }
    }

    /// 只檢查下界，上游 feed 不會給出未來日期
    pub fn admits(&self, published: NaiveDate) -> bool {
        published >= self.start
    }
}

/// 只留下收錄區間內的 entry，保持 feed 原本的順序
pub fn within_window(entries: Vec<PaperRecord>, window: RecencyWindow) -> Vec<PaperRecord> {
    let qualifying: Vec<PaperRecord> = entries
        .into_iter()
        .filter(|paper| window.admits(paper.published))
        .collect();

    tracing::debug!(
        "{} entries published on or after {}",
        qualifying.len(),
        window.start
    );
    qualifying
}

/// 檢查門檻後截斷到 `max_results`
///
/// 門檻以截斷前的候選總數為準。
pub fn enforce_threshold(
    candidates: Vec<PaperRecord>,
    query: &str,
    max_results: usize,
    min_results: usize,
    policy: ShortfallPolicy,
) -> Result<Vec<PaperRecord>> {
    if policy == ShortfallPolicy::Fail && candidates.len() < min_results {
        return Err(DigestError::InsufficientResults {
            query: query.to_string(),
            found: candidates.len(),
            required: min_results,
        });
    }

    Ok(candidates.into_iter().take(max_results).collect())
}
