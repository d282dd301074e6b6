use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sectors a user may subscribe to
pub const ALLOWED_SECTORS: &[&str] = &[
    "energy",
    "financials",
    "materials",
    "it",
    "telecom",
    "consumer",
    "industrials",
    "utilities",
];

/// Subset of the user relevant to personalization. Tickers drive the
/// overlay only and never mutate cached content.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub tickers: Vec<String>,
    pub sectors: Vec<String>,
}

impl User {
    /// Tickers that match the exchange symbol pattern, upper-cased.
    /// Malformed entries are dropped rather than rejected.
    pub fn watched_tickers(&self) -> Vec<String> {
        let pattern = ticker_pattern();

        self.tickers
            .iter()
            .map(|t| t.trim().to_uppercase())
            .filter(|t| pattern.is_match(t))
            .collect()
    }

    #[allow(dead_code)]
    pub fn valid_sectors(&self) -> Vec<String> {
        self.sectors
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| ALLOWED_SECTORS.contains(&s.as_str()))
            .collect()
    }
}

/// The pattern is static, compile it once for the per-request feed path
fn ticker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z][A-Z0-9]{0,11}$").expect("invalid ticker regex"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_tickers(tickers: Vec<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "ivan@example.com".to_string(),
            name: "Ivan".to_string(),
            tickers: tickers.into_iter().map(String::from).collect(),
            sectors: vec![],
        }
    }

    #[test]
    fn watched_tickers_uppercases_and_filters() {
        let user = user_with_tickers(vec!["sber", " GAZP ", "bad ticker", "", "T1"]);
        assert_eq!(user.watched_tickers(), vec!["SBER", "GAZP", "T1"]);
    }

    #[test]
    fn watched_tickers_rejects_leading_digit() {
        let user = user_with_tickers(vec!["1ABC"]);
        assert!(user.watched_tickers().is_empty());
    }

    #[test]
    fn repeated_calls_share_the_compiled_pattern() {
        let user = user_with_tickers(vec!["SBER", "gazp"]);
        let first = user.watched_tickers();
        let second = user.watched_tickers();

        assert_eq!(first, second);
        assert!(std::ptr::eq(ticker_pattern(), ticker_pattern()));
    }

    #[test]
    fn valid_sectors_normalizes_against_allowed_set() {
        let mut user = user_with_tickers(vec![]);
        user.sectors = vec!["Energy".to_string(), "crypto".to_string(), "it".to_string()];
        assert_eq!(user.valid_sectors(), vec!["energy", "it"]);
    }
}
