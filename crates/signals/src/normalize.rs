//! Text cleanup applied to provider payloads before they reach the prompt.
//! The reasoning service copes badly with smart quotes, HTML fragments and
//! trader jargon, so everything is folded to plain, consistent English.

use std::sync::LazyLock;

use regex::Regex;

static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([.,!?;:])").unwrap());
static MISSING_SPACE_AFTER_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.,!?;:])(\S)").unwrap());
static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static SPECIAL_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s$.,!?%-]").unwrap());
static PRICE_SHORTHAND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$(\d+)k\b").unwrap());

/// Cleanup for news article titles and summaries.
pub fn clean_article_text(text: &str) -> String {
    let mut out = text
        .replace('\u{2019}', "'")
        .replace('\u{2018}', "'")
        .replace('\u{201c}', "\"")
        .replace('\u{201d}', "\"")
        .replace('\u{2013}', "-")
        .replace('\u{2014}', "--")
        .replace("TKTK", "");

    out = out.split_whitespace().collect::<Vec<_>>().join(" ");
    out = SPACE_BEFORE_PUNCT.replace_all(&out, "$1").into_owned();
    out = MISSING_SPACE_AFTER_PUNCT
        .replace_all(&out, "$1 $2")
        .into_owned();
    out.trim().to_string()
}

/// Cleanup for headline feeds that carry markup: strips tags and folds the
/// result to ASCII.
pub fn strip_markup(text: &str) -> String {
    let stripped = HTML_TAG.replace_all(text, "");
    let ascii: String = stripped.chars().filter(char::is_ascii).collect();
    ascii.split_whitespace().collect::<Vec<_>>().join(" ")
}

const JARGON: &[(&str, &str)] = &[
    ("btcusdt", "Bitcoin"),
    ("btc/usdt", "Bitcoin"),
    ("btc", "Bitcoin"),
    ("bitcoin", "Bitcoin"),
    ("hodl", "hold"),
    ("dump", "decrease"),
    ("pump", "increase"),
    ("moon", "significant increase"),
    ("fud", "fear uncertainty doubt"),
    ("ath", "all-time high"),
    ("dca", "dollar cost average"),
    ("rsi", "relative strength index"),
];

/// Cleanup for community idea titles and descriptions: drops emoji, expands
/// common trader shorthand and normalizes price notation. Output is capped
/// at `max_length` characters.
pub fn normalize_idea_text(text: &str, max_length: usize) -> String {
    let mut out = SPECIAL_CHARS.replace_all(text, "").into_owned();
    out = out.split_whitespace().collect::<Vec<_>>().join(" ");

    for (jargon, replacement) in JARGON {
        let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(jargon))).unwrap();
        out = pattern.replace_all(&out, *replacement).into_owned();
    }

    out = PRICE_SHORTHAND.replace_all(&out, "$$${1},000").into_owned();
    out.chars().take(max_length).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smart_quotes_are_folded() {
        assert_eq!(
            clean_article_text("Bitcoin\u{2019}s \u{201c}big\u{201d} week"),
            "Bitcoin's \"big\" week"
        );
    }

    #[test]
    fn whitespace_and_punctuation_are_standardized() {
        assert_eq!(
            clean_article_text("Price  rises ,then falls.Again"),
            "Price rises, then falls. Again"
        );
    }

    #[test]
    fn markup_is_stripped() {
        assert_eq!(
            strip_markup("<b>BTC</b> climbs &#8212; analysts cheer\u{00e9}"),
            "BTC climbs &#8212; analysts cheer"
        );
    }

    #[test]
    fn jargon_is_expanded() {
        let out = normalize_idea_text("btc to the moon, hodl!", 1500);
        assert!(out.contains("Bitcoin"));
        assert!(out.contains("significant increase"));
        assert!(out.contains("hold"));
    }

    #[test]
    fn price_shorthand_is_expanded() {
        assert_eq!(normalize_idea_text("target $60k soon", 1500), "target $60,000 soon");
    }

    #[test]
    fn output_is_capped() {
        let long = "a".repeat(3000);
        assert_eq!(normalize_idea_text(&long, 1500).len(), 1500);
    }
}
