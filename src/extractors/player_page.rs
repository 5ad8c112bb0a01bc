//! Alternate strategy for pages that hide the stream behind an embedded
//! player page instead of an inline decryptor: follow the first
//! inline-handler link, scan the player page for manifest urls and register
//! everything against the original source url.

use std::sync::OnceLock;

use log::{info, warn};
use regex::Regex;
use scraper::{Html, Selector};

use crate::{
    models::PlayerLinks,
    registry::LinkRegistry,
    utils::{self, text::scan_manifest_urls},
};

/// Full restarts of the pipeline allowed after an uncaught failure.
pub const MAX_RETRIES: usize = 2;

/// Heuristic allow-list for url attributes on the player page. Known CDN
/// markers, not a correctness guarantee.
const URL_ATTR_MARKERS: [&str; 3] = [".m3u8", "scdns.io", "faselhd"];

/// Run the player pipeline to completion. Never fails: exhausting the
/// retries yields the empty result.
pub async fn extract(url: &str) -> PlayerLinks {
    utils::with_retries(MAX_RETRIES, || run_pipeline(url))
        .await
        .unwrap_or_default()
}

async fn run_pipeline(url: &str) -> anyhow::Result<PlayerLinks> {
    let referer = utils::origin_referer(url);
    let (status, html) = utils::fetch_page(url, &referer).await?;
    info!("[player] {url} responded {status}");

    let plyr_link = find_player_link(&html);
    let mut registry = LinkRegistry::new();

    if let Some(ref player_url) = plyr_link {
        // a broken player stage degrades to "no links", it does not restart
        // the pipeline
        match utils::fetch_page(player_url, url).await {
            Ok((player_status, player_html)) => {
                info!("[player] {player_url} responded {player_status}");
                scan_player_page(&player_html, url, &mut registry);
            }
            Err(err) => warn!("[player] fetching {player_url} failed: {err}"),
        }
    } else {
        info!("[player] no inline-handler element on {url}");
    }

    Ok(PlayerLinks {
        master_link: registry.master_link(url).map(str::to_owned),
        plyr_link,
    })
}

/// First element exposing an inline event handler wins; the site is not
/// known to emit more than one.
pub fn find_player_link(html: &str) -> Option<String> {
    static ONCLICK_SELECTOR: OnceLock<Selector> = OnceLock::new();
    static HANDLER_URL_RE: OnceLock<Regex> = OnceLock::new();

    let document = Html::parse_document(html);
    let handler = document
        .select(ONCLICK_SELECTOR.get_or_init(|| Selector::parse("[onclick]").unwrap()))
        .next()?
        .value()
        .attr("onclick")?;

    HANDLER_URL_RE
        .get_or_init(|| Regex::new(r#"https?://[^'"\s)]+"#).unwrap())
        .find(handler)
        .map(|m| m.as_str().to_owned())
}

/// Scan the player page's script bodies and decorated elements; every hit is
/// registered against the *original* source url.
pub fn scan_player_page(player_html: &str, source_url: &str, registry: &mut LinkRegistry) {
    static SCRIPT_SELECTOR: OnceLock<Selector> = OnceLock::new();
    static URL_ATTR_SELECTOR: OnceLock<Selector> = OnceLock::new();

    let document = Html::parse_document(player_html);

    for script in
        document.select(SCRIPT_SELECTOR.get_or_init(|| Selector::parse("script").unwrap()))
    {
        let body = script.text().collect::<String>();
        for link in scan_manifest_urls(&body) {
            registry.add(source_url, link);
        }
    }

    for el in
        document.select(URL_ATTR_SELECTOR.get_or_init(|| Selector::parse("[data-url]").unwrap()))
    {
        if let Some(link) = el.value().attr("data-url") {
            if URL_ATTR_MARKERS.iter().any(|marker| link.contains(marker)) {
                registry.add(source_url, link);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "https://www.faselhds.biz/video/99";

    #[test]
    fn should_find_first_inline_handler_link() {
        let html = r#"
            <html><body>
                <div onclick="window.open('https://player.example/embed?id=1')">watch</div>
                <div onclick="window.open('https://player.example/embed?id=2')">watch</div>
            </body></html>
        "#;
        assert_eq!(
            find_player_link(html),
            Some("https://player.example/embed?id=1".into())
        );
    }

    #[test]
    fn should_find_no_handler_link() {
        assert_eq!(find_player_link("<html><body><a href=\"/x\">x</a></body></html>"), None);
    }

    #[test]
    fn should_scan_player_page_scripts_and_attributes() {
        let html = r#"
            <html><body>
                <script>var hls = "https://cdn.scdns.io/hls/720.m3u8";</script>
                <script>var master = "https://cdn.scdns.io/hls/master.m3u8";</script>
                <div data-url="https://cdn.scdns.io/stream"></div>
                <div data-url="https://unrelated.example/page"></div>
            </body></html>
        "#;
        let mut registry = LinkRegistry::new();
        scan_player_page(html, SOURCE, &mut registry);

        let links: Vec<_> = registry.links_for(SOURCE).collect();
        assert_eq!(
            links,
            vec![
                "https://cdn.scdns.io/hls/720.m3u8",
                "https://cdn.scdns.io/hls/master.m3u8",
                "https://cdn.scdns.io/stream",
            ]
        );
        assert_eq!(
            registry.master_link(SOURCE),
            Some("https://cdn.scdns.io/hls/master.m3u8")
        );
    }

    #[test_log::test(tokio::test)]
    async fn should_return_empty_links_after_exhausting_retries() {
        // nothing listens on port 1: every attempt's source fetch fails, the
        // pipeline restarts MAX_RETRIES times and then reports empty, it
        // never propagates the failure
        let result = extract("http://127.0.0.1:1/video/1").await;
        assert_eq!(result, PlayerLinks::default());
    }

    #[test_log::test(tokio::test)]
    #[ignore = "hits the live site"]
    async fn should_extract() {
        let result = extract("https://www.faselhds.biz/video/99").await;
        println!("{result:#?}");
    }
}
