//! Candidate extraction from search results.
//!
//! The oracle is asked for a JSON array of company names. Replies arrive in
//! several shapes (`{"companies": [...]}`, a bare array, an object with some
//! other array key) and occasionally as non-JSON prose, so parsing is layered:
//! JSON first, a quoted-substring regex as fallback, and an empty list when
//! nothing salvageable remains. Extraction failure is never fatal to a run.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, instrument, warn};

use partnerscout_shared::{Candidate, SearchHit};

use crate::oracle::Oracle;

/// Build the extraction prompt from hydrated search hits.
pub fn build_extraction_prompt(hits: &[SearchHit], industry: &str, cap: usize) -> String {
    let formatted: Vec<String> = hits
        .iter()
        .map(|hit| {
            let content = if hit.text.is_empty() { &hit.snippet } else { &hit.text };
            format!("Title: {}\nURL: {}\nContent: {}", hit.title, hit.url, content)
        })
        .collect();

    format!(
        "Based on the search results about the {industry} industry, identify the top {cap} \
         companies in this industry.\n\
         Return ONLY a JSON object of the form {{\"companies\": [\"Name\", ...]}}, nothing else.\n\n\
         SEARCH RESULTS:\n{}",
        formatted.join("\n\n")
    )
}

/// Ask the oracle for candidate names and normalize the reply.
///
/// Returns an empty list on any oracle or parse failure.
#[instrument(skip_all, fields(industry = %industry, hits = hits.len()))]
pub async fn extract_candidates(
    oracle: &Oracle,
    hits: &[SearchHit],
    industry: &str,
    cap: usize,
) -> Vec<Candidate> {
    if hits.is_empty() {
        warn!("no search hits to extract from");
        return Vec::new();
    }

    let prompt = build_extraction_prompt(hits, industry, cap);
    let content = match oracle.chat_json(&prompt).await {
        Ok(content) => content,
        Err(e) => {
            warn!(error = %e, "candidate extraction call failed");
            return Vec::new();
        }
    };

    let mut names = parse_names(&content);
    names.truncate(cap);

    info!(candidates = names.len(), "candidates extracted");
    names
        .into_iter()
        .map(|name| Candidate::new(name, industry))
        .collect()
}

/// Parse company names out of an oracle reply, normalized and deduplicated.
pub fn parse_names(content: &str) -> Vec<String> {
    // Fallback pattern: any double-quoted substring is taken as a name.
    static QUOTED_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#""([^"]+)""#).expect("valid regex"));

    let raw = match serde_json::from_str::<serde_json::Value>(content) {
        Ok(value) => names_from_json(&value),
        Err(_) => QUOTED_RE
            .captures_iter(content)
            .map(|c| c[1].to_string())
            .collect(),
    };

    // Whitespace-normalize, drop empties, case-insensitive dedup keeping the
    // first-seen casing.
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for raw_name in raw {
        let name = raw_name.split_whitespace().collect::<Vec<_>>().join(" ");
        if name.is_empty() {
            continue;
        }
        if seen.insert(name.to_lowercase()) {
            names.push(name);
        }
    }
    names
}

/// Pull a string array out of whatever JSON shape the oracle chose.
fn names_from_json(value: &serde_json::Value) -> Vec<String> {
    let array = match value {
        serde_json::Value::Array(items) => Some(items),
        serde_json::Value::Object(map) => map
            .get("companies")
            .and_then(|v| v.as_array())
            .or_else(|| map.values().find_map(|v| v.as_array())),
        _ => None,
    };

    array
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_companies_object() {
        let names = parse_names(r#"{"companies": ["Acme", "RivalCo", "Acme"]}"#);
        assert_eq!(names, vec!["Acme", "RivalCo"]);
    }

    #[test]
    fn parses_bare_array() {
        let names = parse_names(r#"["Acme", "RivalCo"]"#);
        assert_eq!(names, vec!["Acme", "RivalCo"]);
    }

    #[test]
    fn parses_any_array_key() {
        let names = parse_names(r#"{"top_firms": ["Acme Sports"]}"#);
        assert_eq!(names, vec!["Acme Sports"]);
    }

    #[test]
    fn regex_fallback_for_prose() {
        let names = parse_names(r#"The top companies are "Acme" and "RivalCo"."#);
        assert_eq!(names, vec!["Acme", "RivalCo"]);
    }

    #[test]
    fn dedup_is_case_insensitive_keeping_first_casing() {
        let names = parse_names(r#"{"companies": ["Acme Corp", "ACME CORP", "acme corp"]}"#);
        assert_eq!(names, vec!["Acme Corp"]);
    }

    #[test]
    fn whitespace_is_normalized_and_empties_dropped() {
        let names = parse_names(r#"{"companies": ["  Acme   Corp  ", "   ", ""]}"#);
        assert_eq!(names, vec!["Acme Corp"]);
    }

    #[test]
    fn unparseable_content_yields_empty() {
        assert!(parse_names("no names here at all").is_empty());
        assert!(parse_names(r#"{"count": 3}"#).is_empty());
    }

    #[test]
    fn prompt_prefers_text_over_snippet() {
        let hits = vec![
            SearchHit {
                title: "T1".into(),
                url: "u1".into(),
                text: "full text".into(),
                snippet: "snip1".into(),
            },
            SearchHit {
                title: "T2".into(),
                url: "u2".into(),
                text: String::new(),
                snippet: "snip2".into(),
            },
        ];
        let prompt = build_extraction_prompt(&hits, "sports tech", 40);
        assert!(prompt.contains("full text"));
        assert!(!prompt.contains("snip1"));
        assert!(prompt.contains("snip2"));
        assert!(prompt.contains("sports tech"));
    }
}
