//! `Comment:` field parsing and formatting

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref COMMENT_PAIR: Regex =
        Regex::new(r#"([^\s=]+)=(?:"([^"]*)"|(\S*))"#).expect("comment pattern is valid");
}

/// Split a comment into `key=value` pairs, unquoting quoted values.
///
/// Tokens without `=` are ignored; duplicate keys are kept in order.
pub fn parse_comment(comment: &str) -> Vec<(String, String)> {
    COMMENT_PAIR
        .captures_iter(comment)
        .filter_map(|caps| {
            let key = caps.get(1)?.as_str().to_string();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            Some((key, value))
        })
        .collect()
}

/// Render one pair, quoting the value when it holds whitespace.
///
/// Double quotes inside a value become single quotes.
pub fn format_pair(key: &str, value: &str) -> String {
    if value.is_empty()
        || value.chars().any(char::is_whitespace)
        || value.contains('=')
        || value.contains('"')
    {
        format_quoted_pair(key, value)
    } else {
        format!("{}={}", key, value)
    }
}

/// Render one pair with the value always quoted
pub fn format_quoted_pair(key: &str, value: &str) -> String {
    format!("{}=\"{}\"", key, value.replace('"', "'"))
}

/// Parse a `Protein=` value into bare accessions.
///
/// Accepts `sp|ACC|`, `sp|ACC|ENTRY`, comma-joined lists of either, and bare
/// accessions.
pub fn parse_proteins(value: &str) -> Vec<String> {
    let mut accessions: Vec<String> = Vec::new();
    for item in value.trim_matches('"').split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let accession = if item.contains('|') {
            let parts: Vec<&str> = item.split('|').collect();
            match parts.get(1) {
                Some(accession) if !accession.is_empty() => *accession,
                _ => parts[0],
            }
        } else {
            item
        };
        if !accession.is_empty() && !accessions.iter().any(|a| a == accession) {
            accessions.push(accession.to_string());
        }
    }
    accessions
}

/// Format accessions as `sp|ACC|` items joined by commas
pub fn format_proteins(accessions: &[String]) -> String {
    accessions
        .iter()
        .map(|accession| format!("sp|{}|", accession))
        .collect::<Vec<_>>()
        .join(",")
}
