use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Coarse impact of a news block on the covered market.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Positive,
    Neutral,
    Negative,
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Impact::Positive => write!(f, "positive"),
            Impact::Neutral => write!(f, "neutral"),
            Impact::Negative => write!(f, "negative"),
        }
    }
}

impl std::str::FromStr for Impact {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Impact::Positive),
            "neutral" => Ok(Impact::Neutral),
            "negative" => Ok(Impact::Negative),
            _ => Err(format!("Invalid impact: {}", s)),
        }
    }
}

/// How sure the model claims to be about the impact call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Confidence::Low),
            "medium" => Ok(Confidence::Medium),
            "high" => Ok(Confidence::High),
            _ => Err(format!("Invalid confidence: {}", s)),
        }
    }
}

/// Sentiment/impact tag attached to a block. Either fully populated or
/// absent, never half-filled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsIndicator {
    pub impact: Impact,
    pub confidence: Confidence,
    pub rationale: Vec<String>,
}

/// One rendered news-summary unit, tied to one source URL for the current
/// day. Built only by the feed orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsBlock {
    pub title: String,
    pub source: String,
    pub url: String,
    pub summary: String,
    pub bullets: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,
    pub risks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicator: Option<NewsIndicator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asof: Option<NaiveDate>,
}

/// Query parameters for the feed endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct NewsFeedParams {
    /// Force refresh, bypassing the daily cache (default: false)
    pub force: Option<bool>,
}
