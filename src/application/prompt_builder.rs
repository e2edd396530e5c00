//! Prompt Builder
//!
//! Renders the daily-summary prompt from compacted news, the citation list
//! and indicators. Pure and deterministic: the same inputs always produce
//! the same prompt.

use crate::application::news_compactor::CompactNews;
use crate::domain::indicators::IndicatorMap;
use crate::domain::news::NewsItem;
use crate::domain::ports::ModelPrompt;
use std::collections::BTreeSet;

pub const SYSTEM_PROMPT: &str = "You are a helpful financial analyst.";

/// Marker the model is told to put between the report and the signals JSON.
pub const JSON_MARKER: &str = "-->Json:";

const TEMPLATE: &str = r#"
You are a financial analyst. Write in English. Produce a daily market summary from the news and indicators below.

Output format (strict):
-->Markdown
(The complete Markdown report and nothing else.)

The Markdown report has these sections, in order:
1) Daily Brief: one paragraph of 4-7 concise sentences on the day's main market narratives (rates, energy, geopolitics, macro releases) and what they mean for equities. Every non-obvious claim carries an inline numeric citation such as [1] or [2], referring only to entries of the Sources section below.
2) Key Indicators: a very short bullet list. Write this section ONLY when at least one indicator value is present. When none are present, leave the section out entirely; never write "not available" in its place.
3) Per-ticker Insights for the target tickers: short bullets or mini-sections. Every claim is grounded in the supplied News and/or Indicators, and any claim drawn from news carries at least one inline citation [n].
4) Sources: a numbered list 1..N built ONLY from URLs in the supplied News URLs list. Choose the 5-10 most relevant. The numbering must match the inline citations used above.

{marker}
{"signals": [
    {"ticker": "TICKER1", "name": "Company 1", "action": "Buy"|"Sell", "reason": "1-2 sentences tying the call to specific news/indicators (e.g., cites [n])"},
    {"ticker": "TICKER2", "name": "Company 2", "action": "Buy"|"Sell", "reason": "1-2 sentences tying the call to specific news/indicators (e.g., cites [n])"}
]}

Grounding and style rules:
- English only.
- Use the tickers exactly as given (uppercase) and do not add others. Give exactly one Buy or Sell signal per target ticker.
- Base the analysis strictly on the compact News and Indicators supplied here. When something is not in the data, leave it out instead of guessing.
- Every claim taken from news carries an inline citation [n] pointing into the numbered Sources list.
- The JSON must be machine-readable: no comments, no trailing commas, no Markdown code fences.

Inputs:
- News (compact JSON): {news_compact}
- News URLs (list): {news_urls}
- Indicators (JSON): {indicators}
- Target tickers: {tickers}
"#;

pub struct PromptBuilder;

impl PromptBuilder {
    pub fn build(compact: &CompactNews, indicators: &IndicatorMap, tickers: &[String]) -> String {
        let news_compact = serde_json::to_string(&compact.items).unwrap_or_else(|_| "[]".to_string());
        let news_urls = serde_json::to_string(&compact.citations).unwrap_or_else(|_| "[]".to_string());
        let indicators_json = serde_json::to_string(indicators).unwrap_or_else(|_| "{}".to_string());

        let ticker_list = tickers.join(", ");

        render(
            TEMPLATE,
            &[
                ("marker", JSON_MARKER),
                ("news_compact", news_compact.as_str()),
                ("news_urls", news_urls.as_str()),
                ("indicators", indicators_json.as_str()),
                ("tickers", ticker_list.as_str()),
            ],
        )
    }

    pub fn model_prompt(
        compact: &CompactNews,
        indicators: &IndicatorMap,
        tickers: &[String],
    ) -> ModelPrompt {
        ModelPrompt {
            system: SYSTEM_PROMPT.to_string(),
            user: Self::build(compact, indicators, tickers),
        }
    }
}

// Single pass, so placeholder-looking text inside news titles is left alone.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    'scan: while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        rest = &rest[open..];
        for (name, value) in vars {
            let placeholder = format!("{{{}}}", name);
            if rest.starts_with(&placeholder) {
                out.push_str(value);
                rest = &rest[placeholder.len()..];
                continue 'scan;
            }
        }
        out.push('{');
        rest = &rest[1..];
    }
    out.push_str(rest);
    out
}

/// Union of tickers mentioned in news and tickers with indicators, sorted ascending.
pub fn target_tickers(news: &[NewsItem], indicators: &IndicatorMap) -> Vec<String> {
    news.iter()
        .map(|n| n.ticker.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .chain(indicators.keys().cloned())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}
