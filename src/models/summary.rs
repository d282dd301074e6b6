use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::NewsIndicator;

/// Editorial bucket for a news source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NewsCategory {
    Macro,
    Stocks,
}

impl NewsCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsCategory::Macro => "macro",
            NewsCategory::Stocks => "stocks",
        }
    }
}

impl std::fmt::Display for NewsCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for NewsCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "macro" => Ok(NewsCategory::Macro),
            "stocks" => Ok(NewsCategory::Stocks),
            _ => Err(format!("Invalid news category: {}", s)),
        }
    }
}

/// Validated structured summary. Constructed only by the response validator;
/// the raw parsed mapping never crosses that boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SummaryPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub facts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub explanation: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicator: Option<NewsIndicator>,
    /// Internal degradation marker (e.g. "llm_invalid_json"). Non-fatal:
    /// the feed still renders with a fallback summary.
    #[serde(rename = "_error", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SummaryPayload {
    /// Degraded payload carrying only an internal error marker.
    pub fn degraded(marker: &str) -> Self {
        Self {
            error: Some(marker.to_string()),
            ..Self::default()
        }
    }
}

/// Persisted daily summary, one row per (cache_date, category, url).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CachedSummaryRow {
    pub id: Uuid,
    pub cache_date: NaiveDate,
    pub market: String,
    pub category: String,
    pub url: String,
    pub source: String,
    pub title: String,
    pub payload_json: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CachedSummaryRow {
    /// Deserialize the stored payload. A corrupt row degrades the same way
    /// an invalid LLM reply does instead of failing the request.
    pub fn payload(&self) -> SummaryPayload {
        serde_json::from_str(&self.payload_json)
            .unwrap_or_else(|_| SummaryPayload::degraded("cache_invalid_json"))
    }
}

/// Input for upserting a daily summary row
#[derive(Debug, Clone)]
pub struct CreateCachedSummary {
    pub cache_date: NaiveDate,
    pub market: String,
    pub category: String,
    pub url: String,
    pub source: String,
    pub title: String,
    pub payload_json: String,
}
