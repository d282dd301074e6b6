use serde_json::Value;
use tracing::warn;

use crate::models::{Confidence, Impact, NewsIndicator, SummaryPayload};

/// Marker stored when the LLM reply was not parseable JSON
pub const INVALID_JSON_MARKER: &str = "llm_invalid_json";

/// Parse a raw LLM reply into a validated payload. Never fails: malformed
/// input degrades to a payload carrying an internal error marker, and
/// missing optional fields degrade to empty/absent.
pub fn validate_llm_reply(raw: &str) -> SummaryPayload {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("LLM reply is not valid JSON: {}", e);
            return SummaryPayload::degraded(INVALID_JSON_MARKER);
        }
    };

    if !value.is_object() {
        warn!("LLM reply is JSON but not an object");
        return SummaryPayload::degraded(INVALID_JSON_MARKER);
    }

    SummaryPayload {
        summary: coerce_string(value.get("summary")),
        facts: coerce_string_list(value.get("facts")),
        conclusion: coerce_string(value.get("conclusion")),
        explanation: coerce_string_list(value.get("explanation")),
        risks: coerce_string_list(value.get("risks")),
        indicator: coerce_indicator(value.get("indicator")),
        error: None,
    }
}

/// Stripped string or None. Non-string values are treated as absent.
fn coerce_string(value: Option<&Value>) -> Option<String> {
    let s = value?.as_str()?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// List of non-empty stripped strings; anything else degrades to empty
fn coerce_string_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| item.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Indicator is all-or-nothing: both impact and confidence must be present
/// and drawn from their fixed sets, otherwise the whole field is dropped.
fn coerce_indicator(value: Option<&Value>) -> Option<NewsIndicator> {
    let obj = value?.as_object()?;

    let impact: Impact = coerce_string(obj.get("impact"))?
        .to_lowercase()
        .parse()
        .ok()?;
    let confidence: Confidence = coerce_string(obj.get("confidence"))?
        .to_lowercase()
        .parse()
        .ok()?;

    Some(NewsIndicator {
        impact,
        confidence,
        rationale: coerce_string_list(obj.get("rationale")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_json_degrades_to_error_marker() {
        let payload = validate_llm_reply("Извините, вот обзор: рынок вырос");
        assert_eq!(payload.error.as_deref(), Some(INVALID_JSON_MARKER));
        assert!(payload.summary.is_none());
        assert!(payload.facts.is_empty());
        assert!(payload.indicator.is_none());
    }

    #[test]
    fn non_object_json_degrades_to_error_marker() {
        let payload = validate_llm_reply("[1, 2, 3]");
        assert_eq!(payload.error.as_deref(), Some(INVALID_JSON_MARKER));
    }

    #[test]
    fn full_reply_parses() {
        let raw = r#"{
            "summary": "  Рынок вырос.  ",
            "facts": ["Индекс +2%", "  ", "Нефть дорожает"],
            "conclusion": "Позитивный день",
            "explanation": ["Спрос на риск"],
            "risks": ["Санкции"],
            "indicator": {
                "impact": " Positive ",
                "confidence": "HIGH",
                "rationale": ["широкий рост"]
            }
        }"#;

        let payload = validate_llm_reply(raw);
        assert_eq!(payload.summary.as_deref(), Some("Рынок вырос."));
        assert_eq!(payload.facts, vec!["Индекс +2%", "Нефть дорожает"]);
        assert_eq!(payload.conclusion.as_deref(), Some("Позитивный день"));
        assert_eq!(payload.risks, vec!["Санкции"]);
        assert!(payload.error.is_none());

        let indicator = payload.indicator.expect("indicator should survive");
        assert_eq!(indicator.impact, Impact::Positive);
        assert_eq!(indicator.confidence, Confidence::High);
        assert_eq!(indicator.rationale, vec!["широкий рост"]);
    }

    #[test]
    fn indicator_dropped_when_confidence_missing() {
        let raw = r#"{"summary": "ок", "indicator": {"impact": "positive"}}"#;
        let payload = validate_llm_reply(raw);
        assert!(payload.indicator.is_none());
        assert_eq!(payload.summary.as_deref(), Some("ок"));
    }

    #[test]
    fn indicator_dropped_on_unknown_enum_value() {
        let raw = r#"{"indicator": {"impact": "bullish", "confidence": "high"}}"#;
        let payload = validate_llm_reply(raw);
        assert!(payload.indicator.is_none());
        assert!(payload.error.is_none());
    }

    #[test]
    fn indicator_never_half_populated() {
        for raw in [
            r#"{"indicator": {"impact": "positive"}}"#,
            r#"{"indicator": {"confidence": "low"}}"#,
            r#"{"indicator": {"impact": "", "confidence": "low"}}"#,
            r#"{"indicator": {"impact": 1, "confidence": "low"}}"#,
        ] {
            let payload = validate_llm_reply(raw);
            assert!(payload.indicator.is_none(), "expected drop for {}", raw);
        }
    }

    #[test]
    fn missing_fields_degrade_to_empty() {
        let payload = validate_llm_reply("{}");
        assert!(payload.summary.is_none());
        assert!(payload.facts.is_empty());
        assert!(payload.conclusion.is_none());
        assert!(payload.explanation.is_empty());
        assert!(payload.risks.is_empty());
        assert!(payload.indicator.is_none());
        assert!(payload.error.is_none());
    }

    #[test]
    fn non_string_list_entries_are_dropped() {
        let raw = r#"{"facts": ["раз", 2, null, {"x": 1}, "два"]}"#;
        let payload = validate_llm_reply(raw);
        assert_eq!(payload.facts, vec!["раз", "два"]);
    }

    #[test]
    fn payload_round_trips_through_cache_serialization() {
        let raw = r#"{"summary": "ок", "facts": ["ф"], "indicator": {"impact": "negative", "confidence": "low", "rationale": []}}"#;
        let payload = validate_llm_reply(raw);
        let json = serde_json::to_string(&payload).unwrap();
        let restored: SummaryPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(payload, restored);
    }
}
