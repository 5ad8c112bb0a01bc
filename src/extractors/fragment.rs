use std::sync::OnceLock;

use regex::Regex;

/// Marker opening the region that carries the obfuscated decryptor.
pub const FRAGMENT_MARKER: &str = r#"<div class="quality_change">"#;

/// Why a page did not contain the expected fragment. Diagnostic only, the
/// caller's contract is simply "no fragment".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    ChallengeDetected,
    AccessDenied,
    UnknownShape,
}

fn fragment_regex() -> &'static Regex {
    static FRAGMENT_RE: OnceLock<Regex> = OnceLock::new();
    // smallest region from the container marker to the first closing of the
    // expected control element
    FRAGMENT_RE.get_or_init(|| {
        Regex::new(r#"(?s)<div class="quality_change">.*?</button></div>"#).unwrap()
    })
}

/// Locate the smallest HTML region containing the obfuscated decryptor and
/// its container markup.
pub fn locate(html: &str) -> Option<&str> {
    fragment_regex().find(html).map(|m| m.as_str())
}

/// Classify a locate miss for the logs.
pub fn classify_miss(html: &str) -> MissReason {
    if html.contains("Just a moment...") {
        MissReason::ChallengeDetected
    } else if html.contains("Access denied") {
        MissReason::AccessDenied
    } else {
        MissReason::UnknownShape
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_locate_smallest_region() {
        let html = concat!(
            "<html><body>",
            r#"<div class="quality_change"><script>decrypt();</script><button class="hd_btn">720p</button></div>"#,
            r#"<div class="other"><button>x</button></div>"#,
            "</body></html>",
        );
        let fragment = locate(html).unwrap();
        assert!(fragment.starts_with(FRAGMENT_MARKER));
        assert!(fragment.ends_with("</button></div>"));
        assert!(!fragment.contains("other"));
    }

    #[test]
    fn should_return_none_without_marker() {
        assert_eq!(locate("<html><body>nothing here</body></html>"), None);
    }

    #[test]
    fn should_classify_misses() {
        assert_eq!(
            classify_miss("<title>Just a moment...</title>"),
            MissReason::ChallengeDetected
        );
        assert_eq!(classify_miss("Access denied by firewall"), MissReason::AccessDenied);
        assert_eq!(classify_miss("<html></html>"), MissReason::UnknownShape);
    }
}
