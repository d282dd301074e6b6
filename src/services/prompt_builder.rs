use crate::models::NewsCategory;

/// Analytical focus line for a category
fn category_focus(category: NewsCategory) -> &'static str {
    match category {
        NewsCategory::Macro => {
            "Фокус: макроэкономика — инфляция, ставки, курс рубля, бюджет \
             и их влияние на частного инвестора."
        }
        NewsCategory::Stocks => {
            "Фокус: рынок акций — отчётности, дивиденды, корпоративные события \
             и движение котировок конкретных компаний."
        }
    }
}

/// Build the structured-output prompt for one news source. The JSON shape
/// and the enumerations here must stay in sync with the response validator.
pub fn build_news_prompt(category: NewsCategory, article_text: &str) -> String {
    format!(
        r#"Ты — FinPulse, финансовый аналитик для частных инвесторов. Проанализируй текст новостной страницы ниже.

{focus}

Верни СТРОГО один JSON-объект без пояснений вокруг, ровно с такими ключами:
{{
  "summary": "краткий обзор в 2-3 предложения",
  "facts": ["ключевой факт", "..."],
  "conclusion": "короткий вывод для инвестора",
  "explanation": ["почему это важно", "..."],
  "risks": ["риск", "..."],
  "indicator": {{
    "impact": "positive|neutral|negative",
    "confidence": "low|medium|high",
    "rationale": ["обоснование оценки", "..."]
  }}
}}

Правила:
- summary, facts и risks не должны повторять друг друга;
- indicator.impact — строго одно из: positive, neutral, negative;
- indicator.confidence — строго одно из: low, medium, high;
- пиши по-русски.

Текст страницы:
{article}"#,
        focus = category_focus(category),
        article = article_text
    )
}
