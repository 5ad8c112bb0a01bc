use std::sync::OnceLock;

use indexmap::IndexSet;
use regex::Regex;

/// Manifest marker used to pick the adaptive playlist among variants.
pub const MASTER_MANIFEST_MARKER: &str = "master.m3u8";

fn manifest_url_regex() -> &'static Regex {
    static MANIFEST_URL_RE: OnceLock<Regex> = OnceLock::new();
    MANIFEST_URL_RE.get_or_init(|| Regex::new(r#"https?://[^"'\s]+\.m3u8"#).unwrap())
}

/// Scan arbitrary markup or script text for manifest shaped urls,
/// deduplicated by exact string equality in first seen order.
pub fn scan_manifest_urls(content: &str) -> Vec<String> {
    let mut seen: IndexSet<&str> = IndexSet::new();
    for m in manifest_url_regex().find_iter(content) {
        seen.insert(m.as_str());
    }
    seen.into_iter().map(|s| s.to_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_scan_and_dedup_manifest_urls() {
        let content = r#"
            player.src = "https://cdn.example/hls/720.m3u8";
            backup = 'https://cdn.example/hls/480.m3u8'
            again: "https://cdn.example/hls/720.m3u8"
        "#;
        assert_eq!(
            scan_manifest_urls(content),
            vec![
                "https://cdn.example/hls/720.m3u8".to_owned(),
                "https://cdn.example/hls/480.m3u8".to_owned(),
            ]
        );
    }

    #[test]
    fn should_scan_nothing_without_manifest() {
        assert!(scan_manifest_urls("<html><body>nope</body></html>").is_empty());
    }
}
