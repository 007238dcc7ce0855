// src/ingest/normalize.rs
//! Field-level normalization shared by all adapters.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde_json::{Map, Value};

/// Vendor fields that carry a posting title, in lookup order.
pub const TITLE_FIELDS: [&str; 3] = ["jobOpeningName", "title", "name"];

/// Vendor fields that may carry a direct posting link, in lookup order.
pub const LINK_FIELDS: [&str; 4] = ["url", "link", "absolute_url", "applyUrl"];

const UNKNOWN_TITLE: &str = "Unknown";

/// Normalize a posting title: decode entities, strip tags, collapse whitespace.
pub fn normalize_title(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    out
}

/// First non-empty title-like field of a raw posting, normalized.
pub fn pick_title(raw: &Map<String, Value>) -> String {
    TITLE_FIELDS
        .iter()
        .filter_map(|k| raw.get(*k).and_then(Value::as_str))
        .map(normalize_title)
        .find(|t| !t.is_empty())
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string())
}

/// First non-empty link-like field of a raw posting.
pub fn pick_link(raw: &Map<String, Value>) -> Option<String> {
    LINK_FIELDS
        .iter()
        .filter_map(|k| raw.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Identifier from a JSON value. Numbers keep their decimal form so that
/// `123` and `"123"` name the same posting.
pub fn value_to_id(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First of `keys` present in `raw` as a usable identifier.
pub fn pick_id(raw: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| raw.get(*k).and_then(value_to_id))
}

/// Last-resort identifier for sources that do not supply one.
/// Not stable across runs: such postings are re-reported every run.
pub fn synthesize_id(source: &str) -> String {
    tracing::warn!(
        provider = source,
        "posting without identifier, synthesizing a random one"
    );
    uuid::Uuid::new_v4().to_string()
}

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Company name from a BambooHR-style endpoint:
/// `https://acme.bamboohr.com/careers/list` -> `Acme`.
pub fn company_from_endpoint(endpoint: &str) -> Option<String> {
    let url = reqwest::Url::parse(endpoint).ok()?;
    let host = url.host_str()?;
    let label = match host.find(".bamboohr.") {
        Some(idx) => &host[..idx],
        None => host.split('.').next().unwrap_or(host),
    };
    let label = label.trim();
    (!label.is_empty()).then(|| capitalize(label))
}

/// True if `path` already carries an http(s) scheme.
pub fn is_absolute(path: &str) -> bool {
    let p = path.trim_start().as_bytes();
    ["http://", "https://"].iter().any(|scheme| {
        p.get(..scheme.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(scheme.as_bytes()))
    })
}

/// Rewrite a vendor-relative path against `prefix`; absolute links pass through.
pub fn resolve_link(prefix: Option<&str>, path: &str) -> String {
    match prefix {
        Some(p) if !is_absolute(path) => format!("{p}{path}"),
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_title_decodes_and_collapses() {
        let s = "  Senior&nbsp;&nbsp;Engineer <b>(Remote)</b>\n &amp; more ";
        assert_eq!(normalize_title(s), "Senior Engineer (Remote) & more");
    }

    #[test]
    fn pick_title_prefers_bamboo_field_and_falls_back() {
        let raw = json!({"jobOpeningName": "QA Lead", "title": "ignored"});
        assert_eq!(pick_title(raw.as_object().unwrap()), "QA Lead");

        let raw = json!({"name": "  Designer "});
        assert_eq!(pick_title(raw.as_object().unwrap()), "Designer");

        let raw = json!({"department": "R&D"});
        assert_eq!(pick_title(raw.as_object().unwrap()), "Unknown");
    }

    #[test]
    fn ids_accept_strings_and_numbers() {
        assert_eq!(value_to_id(&json!("42")), Some("42".to_string()));
        assert_eq!(value_to_id(&json!(42)), Some("42".to_string()));
        assert_eq!(value_to_id(&json!("  ")), None);
        assert_eq!(value_to_id(&json!(null)), None);
        assert_eq!(value_to_id(&json!(["x"])), None);
    }

    #[test]
    fn company_is_subdomain_before_vendor_suffix() {
        assert_eq!(
            company_from_endpoint("https://giatecscientific.bamboohr.com/careers/list"),
            Some("Giatecscientific".to_string())
        );
        assert_eq!(
            company_from_endpoint("https://jobs.example.org/list"),
            Some("Jobs".to_string())
        );
        assert_eq!(company_from_endpoint("not a url"), None);
    }

    #[test]
    fn relative_links_get_prefix() {
        let p = Some("https://acme.wd1.myworkdayjobs.com/en-US/acme");
        assert_eq!(
            resolve_link(p, "/job/Ottawa/Dev_R1"),
            "https://acme.wd1.myworkdayjobs.com/en-US/acme/job/Ottawa/Dev_R1"
        );
        assert_eq!(resolve_link(p, "https://x.test/j/1"), "https://x.test/j/1");
        assert_eq!(resolve_link(None, "/job/1"), "/job/1");
    }

    #[test]
    fn only_a_real_scheme_counts_as_absolute() {
        assert!(is_absolute("https://x.test/j/1"));
        assert!(is_absolute("HTTP://x.test/j/1"));
        assert!(!is_absolute("httpdocs/job/1"));
        assert!(!is_absolute("http-careers/job/1"));
        assert_eq!(
            resolve_link(Some("https://acme.test/"), "httpdocs/job/1"),
            "https://acme.test/httpdocs/job/1"
        );
    }

    #[test]
    fn synthesized_ids_are_unique() {
        assert_ne!(synthesize_id("X"), synthesize_id("X"));
    }
}
