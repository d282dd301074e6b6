use crate::models::NewsCategory;

/// The single market currently served by the feed
pub const DEFAULT_MARKET: &str = "russia";

/// Feed length ceiling per request
pub const MAX_FEED_BLOCKS: usize = 3;

/// Static source table: market -> category -> ordered URL list
pub fn sources_for(market: &str, category: NewsCategory) -> &'static [&'static str] {
    match (market, category) {
        ("russia", NewsCategory::Macro) => &[
            "https://www.rbc.ru/economics/",
            "https://www.vedomosti.ru/rubrics/economics",
        ],
        ("russia", NewsCategory::Stocks) => &[
            "https://www.rbc.ru/finances/",
            "https://www.rbc.ru/quote/",
        ],
        _ => &[],
    }
}

/// Pick up to `max_blocks` (category, url) tuples for a market: exactly one
/// macro source (the first configured), then stocks sources in configured
/// order while the budget lasts. Deterministic, never user-randomized.
pub fn pick_sources(market: &str, max_blocks: usize) -> Vec<(NewsCategory, &'static str)> {
    pick_from(
        sources_for(market, NewsCategory::Macro),
        sources_for(market, NewsCategory::Stocks),
        max_blocks,
    )
}

fn pick_from<'a>(
    macro_urls: &[&'a str],
    stocks_urls: &[&'a str],
    max_blocks: usize,
) -> Vec<(NewsCategory, &'a str)> {
    let mut picked: Vec<(NewsCategory, &str)> = Vec::new();

    if let Some(url) = macro_urls.first() {
        picked.push((NewsCategory::Macro, url));
    }

    for url in stocks_urls {
        if picked.len() >= max_blocks {
            break;
        }
        picked.push((NewsCategory::Stocks, url));
    }

    picked.truncate(max_blocks);
    picked
}
