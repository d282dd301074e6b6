use crate::models::SummaryPayload;

/// Surface the user's watched tickers mentioned in a payload. Matching runs
/// over an upper-cased blob of facts + conclusion; any hit prepends one
/// synthetic fact line ahead of the LLM-produced facts. Pure: the shared
/// cached payload is never mutated, only this per-request copy.
pub fn apply_ticker_overlay(mut payload: SummaryPayload, tickers: &[String]) -> SummaryPayload {
    if tickers.is_empty() {
        return payload;
    }

    let mut blob = payload.facts.join(" ");
    if let Some(conclusion) = &payload.conclusion {
        blob.push(' ');
        blob.push_str(conclusion);
    }
    let blob = blob.to_uppercase();

    let matched: Vec<String> = tickers
        .iter()
        .map(|t| t.to_uppercase())
        .filter(|t| !t.is_empty() && blob.contains(t.as_str()))
        .collect();

    if !matched.is_empty() {
        payload.facts.insert(
            0,
            format!("Упоминаются ваши тикеры: {}", matched.join(", ")),
        );
    }

    payload
}
